//! Task repository: CRUD, state transitions, and the archived view.

use super::query::{Conditions, PageParams, UpdateSet};
use super::{Database, now_rfc3339, parse_timestamp};
use crate::error::{Error, Result};
use crate::types::{ArchivedPage, NewTask, Status, Task, TaskPatch};
use crate::validate::{check_title, normalize_tags};
use rusqlite::{Connection, Row, ToSql, params};
use std::str::FromStr;

/// Column list every task SELECT uses, in [`parse_task_row`] order.
const TASK_COLUMNS: &str = "id, title, description, status, archived, created_at, updated_at";

pub(crate) fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let status_raw: String = row.get(3)?;
    let status = Status::from_str(&status_raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status,
        tags: Vec::new(),
        archived: row.get::<_, i64>(4)? != 0,
        created_at: parse_timestamp(&row.get::<_, String>(5)?, 5)?,
        updated_at: parse_timestamp(&row.get::<_, String>(6)?, 6)?,
    })
}

/// Fetch the tag set for one task, in insertion order.
fn fetch_tags(conn: &Connection, task_id: i64) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT tag FROM task_tags WHERE task_id = ?1 ORDER BY id")?;
    let tags = stmt
        .query_map(params![task_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(tags)
}

/// Insert one tag row per entry. Callers pass an already-normalized set and
/// run this inside their transaction.
fn insert_tags(conn: &Connection, task_id: i64, tags: &[String]) -> Result<()> {
    for tag in tags {
        conn.execute(
            "INSERT INTO task_tags (task_id, tag) VALUES (?1, ?2)",
            params![task_id, tag],
        )?;
    }
    Ok(())
}

/// Replace the whole tag set for a task (delete-then-insert).
fn replace_tags(conn: &Connection, task_id: i64, tags: &[String]) -> Result<()> {
    conn.execute("DELETE FROM task_tags WHERE task_id = ?1", params![task_id])?;
    insert_tags(conn, task_id, tags)
}

/// Look up one task with its tags using an existing connection.
fn get_task_internal(conn: &Connection, id: i64) -> Result<Task> {
    let mut stmt = conn.prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"))?;

    match stmt.query_row(params![id], parse_task_row) {
        Ok(mut task) => {
            task.tags = fetch_tags(conn, id)?;
            Ok(task)
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Err(Error::NotFound(id)),
        Err(e) => Err(e.into()),
    }
}

impl Database {
    /// Create a task with status Planning and the normalized tag set.
    ///
    /// The task row and its tag rows land in one transaction; a failed tag
    /// insert rolls the whole creation back.
    pub fn create_task(&self, input: &NewTask) -> Result<Task> {
        check_title(&input.title)?;
        let tags = normalize_tags(&input.tags);
        let now = now_rfc3339();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            tx.execute(
                "INSERT INTO tasks (title, description, status, archived, created_at, updated_at)
                 VALUES (?1, ?2, ?3, 0, ?4, ?5)",
                params![
                    input.title,
                    input.description,
                    Status::Planning.as_str(),
                    now,
                    now
                ],
            )?;
            let id = tx.last_insert_rowid();
            insert_tags(&tx, id, &tags)?;

            let task = get_task_internal(&tx, id)?;
            tx.commit()?;
            Ok(task)
        })
    }

    /// Fetch one task with its tags.
    pub fn get_task(&self, id: i64) -> Result<Task> {
        self.with_conn(|conn| get_task_internal(conn, id))
    }

    /// All unarchived tasks, newest first, tags attached.
    ///
    /// Unpaginated: the active board is assumed to stay small.
    pub fn list_active(&self) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks WHERE archived = 0 ORDER BY id DESC"
            ))?;
            let mut tasks = stmt
                .query_map([], parse_task_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            for task in &mut tasks {
                task.tags = fetch_tags(conn, task.id)?;
            }
            Ok(tasks)
        })
    }

    /// Paginated view of archived tasks, optionally filtered by a substring
    /// match over title, description, or any tag.
    pub fn list_archived(&self, search: Option<&str>, page: PageParams) -> Result<ArchivedPage> {
        self.with_conn(|conn| {
            let mut cond = Conditions::new();
            let archived = cond.bind(1i64);
            cond.clause(format!("archived = {archived}"));

            if let Some(q) = search.map(str::trim).filter(|q| !q.is_empty()) {
                let pattern = format!("%{q}%");
                let title = cond.bind(pattern.clone());
                let description = cond.bind(pattern.clone());
                let tag = cond.bind(pattern);
                cond.clause(format!(
                    "(title LIKE {title} OR description LIKE {description} \
                     OR id IN (SELECT task_id FROM task_tags WHERE tag LIKE {tag}))"
                ));
            }

            let where_sql = cond.where_sql();
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM tasks {where_sql}"),
                cond.params().as_slice(),
                |row| row.get(0),
            )?;

            let sql = format!(
                "SELECT {TASK_COLUMNS} FROM tasks {where_sql} ORDER BY id DESC LIMIT {} OFFSET {}",
                page.page_size,
                page.offset()
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut items = stmt
                .query_map(cond.params().as_slice(), parse_task_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            for task in &mut items {
                task.tags = fetch_tags(conn, task.id)?;
            }

            let has_more = page.offset() + items.len() as i64 < total;
            Ok(ArchivedPage {
                items,
                total,
                page: page.page,
                page_size: page.page_size,
                has_more,
            })
        })
    }

    /// Partial field update. `updated_at` is refreshed even when only the
    /// tag set changes; a supplied tag set replaces the whole set.
    pub fn update_task(&self, id: i64, patch: &TaskPatch) -> Result<()> {
        if let Some(ref title) = patch.title {
            check_title(title)?;
        }
        let tags = patch.tags.as_deref().map(normalize_tags);
        let now = now_rfc3339();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let mut set = UpdateSet::new();
            if let Some(ref title) = patch.title {
                set.set("title", title.clone());
            }
            if let Some(ref description) = patch.description {
                set.set("description", description.clone());
            }
            set.set("updated_at", now.clone());

            let (sql, set_params) = set.into_update("tasks", id);
            let refs: Vec<&dyn ToSql> = set_params.iter().map(|b| b.as_ref()).collect();
            let affected = tx.execute(&sql, refs.as_slice())?;
            if affected == 0 {
                return Err(Error::NotFound(id));
            }

            if let Some(ref tags) = tags {
                replace_tags(&tx, id, tags)?;
            }

            tx.commit()?;
            Ok(())
        })
    }

    /// Apply a status change. Callers validate by parsing into [`Status`]
    /// at the boundary; the closed enum is what makes unknown labels
    /// unrepresentable here.
    pub fn set_status(&self, id: i64, status: Status) -> Result<()> {
        let now = now_rfc3339();
        self.with_conn(|conn| {
            let affected = conn.execute(
                "UPDATE tasks SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.as_str(), now, id],
            )?;
            if affected == 0 {
                return Err(Error::NotFound(id));
            }
            Ok(())
        })
    }

    /// Hide a task from the active list. Archiving an already-archived task
    /// succeeds and still refreshes `updated_at`.
    pub fn archive(&self, id: i64) -> Result<()> {
        let now = now_rfc3339();
        self.with_conn(|conn| {
            let affected = conn.execute(
                "UPDATE tasks SET archived = 1, updated_at = ?1 WHERE id = ?2",
                params![now, id],
            )?;
            if affected == 0 {
                return Err(Error::NotFound(id));
            }
            Ok(())
        })
    }

    /// Return a task to the active list. Status is unconditionally reset to
    /// Planning, whatever it was before archiving.
    pub fn restore(&self, id: i64) -> Result<()> {
        let now = now_rfc3339();
        self.with_conn(|conn| {
            let affected = conn.execute(
                "UPDATE tasks SET archived = 0, status = ?1, updated_at = ?2 WHERE id = ?3",
                params![Status::Planning.as_str(), now, id],
            )?;
            if affected == 0 {
                return Err(Error::NotFound(id));
            }
            Ok(())
        })
    }

    /// Copy a task's title, description, status, and tags into a new task.
    /// The copy is always unarchived, even when the source is archived.
    pub fn duplicate(&self, id: i64) -> Result<Task> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let src = get_task_internal(&tx, id)?;
            let now = now_rfc3339();
            tx.execute(
                "INSERT INTO tasks (title, description, status, archived, created_at, updated_at)
                 VALUES (?1, ?2, ?3, 0, ?4, ?5)",
                params![src.title, src.description, src.status.as_str(), now, now],
            )?;
            let new_id = tx.last_insert_rowid();
            insert_tags(&tx, new_id, &src.tags)?;

            let task = get_task_internal(&tx, new_id)?;
            tx.commit()?;
            Ok(task)
        })
    }

    /// Remove a task permanently; its tag rows go with it via the foreign-key
    /// cascade. Deleting a missing id succeeds.
    pub fn delete_task(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
            Ok(())
        })
    }
}
