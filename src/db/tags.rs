//! Distinct tag listing across the whole board.

use super::Database;
use crate::error::Result;
use rusqlite::params;

impl Database {
    /// Distinct tag strings across all tasks, sorted ascending, optionally
    /// filtered by substring match.
    pub fn list_tags(&self, query: Option<&str>) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let tags = match query.map(str::trim).filter(|q| !q.is_empty()) {
                Some(q) => {
                    let mut stmt = conn.prepare(
                        "SELECT DISTINCT tag FROM task_tags WHERE tag LIKE ?1 ORDER BY tag",
                    )?;
                    stmt.query_map(params![format!("%{q}%")], |row| row.get(0))?
                        .collect::<std::result::Result<Vec<String>, _>>()?
                }
                None => {
                    let mut stmt =
                        conn.prepare("SELECT DISTINCT tag FROM task_tags ORDER BY tag")?;
                    stmt.query_map([], |row| row.get(0))?
                        .collect::<std::result::Result<Vec<String>, _>>()?
                }
            };
            Ok(tags)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewTask;

    fn create(db: &Database, title: &str, tags: &[&str]) {
        db.create_task(&NewTask {
            title: title.to_string(),
            description: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        })
        .unwrap();
    }

    #[test]
    fn test_distinct_and_sorted() {
        let db = Database::open_in_memory().unwrap();
        create(&db, "one", &["ops", "infra"]);
        create(&db, "two", &["infra", "api"]);

        assert_eq!(db.list_tags(None).unwrap(), vec!["api", "infra", "ops"]);
    }

    #[test]
    fn test_substring_filter() {
        let db = Database::open_in_memory().unwrap();
        create(&db, "one", &["backend", "frontend", "ops"]);

        assert_eq!(
            db.list_tags(Some("end")).unwrap(),
            vec!["backend", "frontend"]
        );
        assert!(db.list_tags(Some("xyz123")).unwrap().is_empty());
    }

    #[test]
    fn test_blank_filter_lists_everything() {
        let db = Database::open_in_memory().unwrap();
        create(&db, "one", &["ops"]);

        assert_eq!(db.list_tags(Some("  ")).unwrap(), vec!["ops"]);
    }

    #[test]
    fn test_empty_board_yields_no_tags() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.list_tags(None).unwrap().is_empty());
    }
}
