use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params, params_from_iter};
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::{DbPool, ProgressStore, StoreError, StoreResult, UserStore, WordListStore, run_migrations, try_lock};
use crate::domain::{
  Badge, ProgressKey, ProgressRecord, TextUnit, TextUnitUpdate, UserGameState, Word, WordList, WordListUpdate,
};
use crate::validation::{normalize_text, normalize_words};

const PROGRESS_COLUMNS: &str = "user_id, word_id, list_id, repetitions, correct_count, wrong_count, \
                                last_seen, next_review, interval_days";

pub struct SqliteStore {
  pool: DbPool,
}

impl SqliteStore {
  /// Open (or create) the database file and bring its schema up to date
  pub fn open(path: &Path) -> StoreResult<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }

    // Create backup before migrations if database exists
    if path.exists() {
      let backup_path = path.with_extension("db.backup");
      if let Err(e) = std::fs::copy(path, &backup_path) {
        tracing::warn!("Could not create database backup: {}", e);
      }
    }

    Self::from_connection(Connection::open(path)?)
  }

  pub fn from_connection(conn: Connection) -> StoreResult<Self> {
    run_migrations(&conn)?;
    Ok(Self {
      pool: Arc::new(Mutex::new(conn)),
    })
  }
}

fn parse_time(index: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(value)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}

fn parse_words(index: usize, value: &str) -> rusqlite::Result<Vec<Word>> {
  serde_json::from_str(value)
    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}

fn row_to_progress(row: &Row) -> rusqlite::Result<ProgressRecord> {
  let last_seen: String = row.get(6)?;
  let next_review: Option<String> = row.get(7)?;

  Ok(ProgressRecord {
    key: ProgressKey {
      user_id: row.get(0)?,
      word_id: row.get(1)?,
      list_id: row.get(2)?,
    },
    repetitions: row.get(3)?,
    correct_count: row.get(4)?,
    wrong_count: row.get(5)?,
    last_seen: parse_time(6, &last_seen)?,
    next_review: next_review.as_deref().map(|s| parse_time(7, s)).transpose()?,
    interval: row.get(8)?,
  })
}

fn row_to_word_list(row: &Row) -> rusqlite::Result<WordList> {
  let id: i64 = row.get(0)?;
  let words: String = row.get(3)?;
  let created_at: String = row.get(4)?;

  Ok(WordList {
    id: id.to_string(),
    teacher_id: row.get(1)?,
    name: row.get(2)?,
    words: parse_words(3, &words)?,
    created_at: parse_time(4, &created_at)?,
  })
}

fn row_to_text_unit(row: &Row) -> rusqlite::Result<TextUnit> {
  let id: i64 = row.get(0)?;
  let words: String = row.get(4)?;
  let created_at: String = row.get(5)?;

  Ok(TextUnit {
    id: id.to_string(),
    teacher_id: row.get(1)?,
    title: row.get(2)?,
    text: row.get(3)?,
    words: parse_words(4, &words)?,
    created_at: parse_time(5, &created_at)?,
  })
}

fn get_word_list(conn: &Connection, id: &str) -> rusqlite::Result<Option<WordList>> {
  conn
    .query_row(
      "SELECT id, teacher_id, name, words, created_at FROM word_lists WHERE id = ?1",
      params![id],
      row_to_word_list,
    )
    .optional()
}

fn get_progress(conn: &Connection, key: &ProgressKey) -> rusqlite::Result<Option<ProgressRecord>> {
  conn
    .query_row(
      &format!(
        "SELECT {} FROM progress WHERE user_id = ?1 AND word_id = ?2 AND list_id = ?3",
        PROGRESS_COLUMNS
      ),
      params![key.user_id, key.word_id, key.list_id],
      row_to_progress,
    )
    .optional()
}

fn put_progress(conn: &Connection, record: &ProgressRecord) -> rusqlite::Result<()> {
  conn.execute(
    &format!(
      r#"
      INSERT INTO progress ({})
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
      ON CONFLICT (user_id, word_id, list_id) DO UPDATE SET
        repetitions = excluded.repetitions,
        correct_count = excluded.correct_count,
        wrong_count = excluded.wrong_count,
        last_seen = excluded.last_seen,
        next_review = excluded.next_review,
        interval_days = excluded.interval_days
      "#,
      PROGRESS_COLUMNS
    ),
    params![
      record.key.user_id,
      record.key.word_id,
      record.key.list_id,
      record.repetitions,
      record.correct_count,
      record.wrong_count,
      record.last_seen.to_rfc3339(),
      record.next_review.map(|t| t.to_rfc3339()),
      record.interval,
    ],
  )?;
  Ok(())
}

fn get_text_unit(conn: &Connection, id: &str) -> rusqlite::Result<Option<TextUnit>> {
  conn
    .query_row(
      "SELECT id, teacher_id, title, body, words, created_at FROM text_units WHERE id = ?1",
      params![id],
      row_to_text_unit,
    )
    .optional()
}

impl ProgressStore for SqliteStore {
  fn progress_for_user(&self, user_id: &str, list_id: Option<&str>) -> StoreResult<Vec<ProgressRecord>> {
    let conn = try_lock(&self.pool)?;
    let mut stmt = conn.prepare(&format!(
      "SELECT {} FROM progress WHERE user_id = ?1 AND (?2 IS NULL OR list_id = ?2) ORDER BY id",
      PROGRESS_COLUMNS
    ))?;
    let records = stmt
      .query_map(params![user_id, list_id], row_to_progress)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(records)
  }

  fn progress_record(&self, key: &ProgressKey) -> StoreResult<Option<ProgressRecord>> {
    let conn = try_lock(&self.pool)?;
    Ok(get_progress(&conn, key)?)
  }

  fn update_progress(
    &self,
    key: &ProgressKey,
    update: &dyn Fn(Option<&ProgressRecord>) -> ProgressRecord,
  ) -> StoreResult<ProgressRecord> {
    let mut conn = try_lock(&self.pool)?;
    // Take the write lock up front so the read and write see the same row
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let existing = get_progress(&tx, key)?;
    let record = update(existing.as_ref());
    put_progress(&tx, &record)?;
    tx.commit()?;
    Ok(record)
  }

  fn progress_for_lists(&self, list_ids: &[String]) -> StoreResult<Vec<ProgressRecord>> {
    if list_ids.is_empty() {
      return Ok(Vec::new());
    }
    let placeholders = vec!["?"; list_ids.len()].join(", ");
    let conn = try_lock(&self.pool)?;
    let mut stmt = conn.prepare(&format!(
      "SELECT {} FROM progress WHERE list_id IN ({}) ORDER BY id",
      PROGRESS_COLUMNS, placeholders
    ))?;
    let records = stmt
      .query_map(params_from_iter(list_ids.iter()), row_to_progress)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(records)
  }
}

impl WordListStore for SqliteStore {
  fn create_word_list(
    &self,
    teacher_id: &str,
    name: &str,
    words: &[Word],
    now: DateTime<Utc>,
  ) -> StoreResult<WordList> {
    let mut conn = try_lock(&self.pool)?;
    let tx = conn.transaction()?;
    let name = normalize_text(name);
    tx.execute(
      "INSERT INTO word_lists (teacher_id, name, created_at) VALUES (?1, ?2, ?3)",
      params![teacher_id, name, now.to_rfc3339()],
    )?;
    let id = tx.last_insert_rowid().to_string();

    // Word ids derive from the list id; a validation error drops the transaction
    let words = normalize_words(words, &id)?;
    tx.execute(
      "UPDATE word_lists SET words = ?1 WHERE id = ?2",
      params![serde_json::to_string(&words)?, id],
    )?;
    tx.commit()?;

    Ok(WordList {
      id,
      teacher_id: teacher_id.to_string(),
      name,
      words,
      created_at: now,
    })
  }

  fn word_lists(&self, teacher_id: Option<&str>) -> StoreResult<Vec<WordList>> {
    let conn = try_lock(&self.pool)?;
    let mut stmt = conn.prepare(
      "SELECT id, teacher_id, name, words, created_at FROM word_lists
       WHERE ?1 IS NULL OR teacher_id = ?1 ORDER BY id",
    )?;
    let lists = stmt
      .query_map(params![teacher_id], row_to_word_list)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(lists)
  }

  fn word_list(&self, id: &str) -> StoreResult<Option<WordList>> {
    let conn = try_lock(&self.pool)?;
    Ok(get_word_list(&conn, id)?)
  }

  fn update_word_list(&self, id: &str, update: &WordListUpdate) -> StoreResult<WordList> {
    let mut conn = try_lock(&self.pool)?;
    let tx = conn.transaction()?;
    let mut list = get_word_list(&tx, id)?.ok_or_else(|| StoreError::not_found("word list", id))?;

    if let Some(words) = &update.words {
      list.words = normalize_words(words, &list.id)?;
    }
    if let Some(name) = &update.name {
      list.name = normalize_text(name);
    }

    tx.execute(
      "UPDATE word_lists SET name = ?1, words = ?2 WHERE id = ?3",
      params![list.name, serde_json::to_string(&list.words)?, list.id],
    )?;
    tx.commit()?;
    Ok(list)
  }

  fn delete_word_list(&self, id: &str) -> StoreResult<()> {
    let conn = try_lock(&self.pool)?;
    let deleted = conn.execute("DELETE FROM word_lists WHERE id = ?1", params![id])?;
    if deleted == 0 {
      return Err(StoreError::not_found("word list", id));
    }
    Ok(())
  }

  fn create_text_unit(
    &self,
    teacher_id: &str,
    title: &str,
    text: &str,
    words: &[Word],
    now: DateTime<Utc>,
  ) -> StoreResult<TextUnit> {
    let mut conn = try_lock(&self.pool)?;
    let tx = conn.transaction()?;
    let title = normalize_text(title);
    let text = text.trim().to_string();
    tx.execute(
      "INSERT INTO text_units (teacher_id, title, body, created_at) VALUES (?1, ?2, ?3, ?4)",
      params![teacher_id, title, text, now.to_rfc3339()],
    )?;
    let id = tx.last_insert_rowid().to_string();

    let words = normalize_words(words, &id)?;
    tx.execute(
      "UPDATE text_units SET words = ?1 WHERE id = ?2",
      params![serde_json::to_string(&words)?, id],
    )?;
    tx.commit()?;

    Ok(TextUnit {
      id,
      teacher_id: teacher_id.to_string(),
      title,
      text,
      words,
      created_at: now,
    })
  }

  fn text_units(&self, teacher_id: Option<&str>) -> StoreResult<Vec<TextUnit>> {
    let conn = try_lock(&self.pool)?;
    let mut stmt = conn.prepare(
      "SELECT id, teacher_id, title, body, words, created_at FROM text_units
       WHERE ?1 IS NULL OR teacher_id = ?1 ORDER BY id",
    )?;
    let units = stmt
      .query_map(params![teacher_id], row_to_text_unit)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(units)
  }

  fn text_unit(&self, id: &str) -> StoreResult<Option<TextUnit>> {
    let conn = try_lock(&self.pool)?;
    Ok(get_text_unit(&conn, id)?)
  }

  fn update_text_unit(&self, id: &str, update: &TextUnitUpdate) -> StoreResult<TextUnit> {
    let mut conn = try_lock(&self.pool)?;
    let tx = conn.transaction()?;
    let mut unit = get_text_unit(&tx, id)?.ok_or_else(|| StoreError::not_found("text unit", id))?;

    if let Some(words) = &update.words {
      unit.words = normalize_words(words, &unit.id)?;
    }
    if let Some(title) = &update.title {
      unit.title = normalize_text(title);
    }
    if let Some(text) = &update.text {
      unit.text = text.trim().to_string();
    }

    tx.execute(
      "UPDATE text_units SET title = ?1, body = ?2, words = ?3 WHERE id = ?4",
      params![unit.title, unit.text, serde_json::to_string(&unit.words)?, unit.id],
    )?;
    tx.commit()?;
    Ok(unit)
  }

  fn delete_text_unit(&self, id: &str) -> StoreResult<()> {
    let conn = try_lock(&self.pool)?;
    let deleted = conn.execute("DELETE FROM text_units WHERE id = ?1", params![id])?;
    if deleted == 0 {
      return Err(StoreError::not_found("text unit", id));
    }
    Ok(())
  }
}

impl UserStore for SqliteStore {
  fn game_state(&self, user_id: &str) -> StoreResult<UserGameState> {
    let conn = try_lock(&self.pool)?;
    let row = conn
      .query_row(
        "SELECT xp, level, total_score, badges FROM game_states WHERE user_id = ?1",
        params![user_id],
        |row| {
          Ok((
            row.get::<_, u32>(0)?,
            row.get::<_, u32>(1)?,
            row.get::<_, u32>(2)?,
            row.get::<_, String>(3)?,
          ))
        },
      )
      .optional()?;

    let Some((xp, level, total_score, badges)) = row else {
      return Ok(UserGameState::new(user_id));
    };

    Ok(UserGameState {
      user_id: user_id.to_string(),
      xp,
      level,
      total_score,
      badges: badges.split(',').filter_map(Badge::from_id).collect(),
    })
  }

  fn save_game_state(&self, state: &UserGameState) -> StoreResult<()> {
    let conn = try_lock(&self.pool)?;
    let badges = state.badges.iter().map(|b| b.id()).collect::<Vec<_>>().join(",");
    conn.execute(
      r#"
      INSERT INTO game_states (user_id, xp, level, total_score, badges)
      VALUES (?1, ?2, ?3, ?4, ?5)
      ON CONFLICT (user_id) DO UPDATE SET
        xp = excluded.xp,
        level = excluded.level,
        total_score = excluded.total_score,
        badges = excluded.badges
      "#,
      params![state.user_id, state.xp, state.level, state.total_score, badges],
    )?;
    Ok(())
  }
}
