use rusqlite::{Connection, Result};

pub fn run_migrations(conn: &Connection) -> Result<()> {
  conn.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS word_lists (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      teacher_id TEXT NOT NULL,
      name TEXT NOT NULL,
      -- JSON array of words
      words TEXT NOT NULL DEFAULT '[]',
      created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS text_units (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      teacher_id TEXT NOT NULL,
      title TEXT NOT NULL,
      body TEXT NOT NULL,
      words TEXT NOT NULL DEFAULT '[]',
      created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS progress (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      user_id TEXT NOT NULL,
      word_id TEXT NOT NULL,
      list_id TEXT NOT NULL,
      repetitions INTEGER NOT NULL DEFAULT 0,
      correct_count INTEGER NOT NULL DEFAULT 0,
      wrong_count INTEGER NOT NULL DEFAULT 0,
      last_seen TEXT NOT NULL,
      next_review TEXT,
      interval_days INTEGER NOT NULL DEFAULT 1,
      UNIQUE (user_id, word_id, list_id)
    );

    CREATE TABLE IF NOT EXISTS game_states (
      user_id TEXT PRIMARY KEY,
      xp INTEGER NOT NULL DEFAULT 0,
      level INTEGER NOT NULL DEFAULT 1,
      total_score INTEGER NOT NULL DEFAULT 0,
      -- Comma-separated badge ids
      badges TEXT NOT NULL DEFAULT ''
    );

    -- Indexes
    CREATE INDEX IF NOT EXISTS idx_word_lists_teacher ON word_lists(teacher_id);
    CREATE INDEX IF NOT EXISTS idx_text_units_teacher ON text_units(teacher_id);
    CREATE INDEX IF NOT EXISTS idx_progress_user ON progress(user_id, list_id);
    CREATE INDEX IF NOT EXISTS idx_progress_list ON progress(list_id);
    "#,
  )?;

  Ok(())
}
