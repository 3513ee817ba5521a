//! Tables and views the dashboard reads. The agent owns this schema; the DDL is
//! only applied on request, for local development and tests.

pub const AGENT_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS memories (
  id TEXT PRIMARY KEY,
  type TEXT NOT NULL,
  status TEXT NOT NULL DEFAULT 'active',
  content TEXT NOT NULL,
  importance REAL NOT NULL DEFAULT 0.5,
  trust_level REAL NOT NULL DEFAULT 0.5,
  created_at TEXT NOT NULL,
  updated_at TEXT,
  last_accessed TEXT
);
CREATE INDEX IF NOT EXISTS idx_memories_status_type ON memories(status, type);

CREATE TABLE IF NOT EXISTS episodic_memories (
  memory_id TEXT PRIMARY KEY REFERENCES memories(id),
  action_taken TEXT,
  context TEXT,
  result TEXT,
  emotional_valence REAL,
  verification_status INTEGER,
  event_time TEXT
);

CREATE TABLE IF NOT EXISTS semantic_memories (
  memory_id TEXT PRIMARY KEY REFERENCES memories(id),
  confidence REAL NOT NULL DEFAULT 0.5,
  last_validated TEXT,
  category TEXT,
  related_concepts TEXT
);

CREATE TABLE IF NOT EXISTS working_memory (
  id TEXT PRIMARY KEY,
  content TEXT NOT NULL,
  expiry TEXT,
  created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS memory_clusters (
  id TEXT PRIMARY KEY,
  name TEXT NOT NULL,
  cluster_type TEXT,
  importance_score REAL NOT NULL DEFAULT 0,
  last_activated TEXT,
  created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS episodes (
  id TEXT PRIMARY KEY,
  started_at TEXT NOT NULL,
  ended_at TEXT,
  episode_type TEXT,
  summary TEXT
);

CREATE TABLE IF NOT EXISTS heartbeat_state (
  id INTEGER PRIMARY KEY CHECK (id = 1),
  current_energy REAL,
  heartbeat_count INTEGER,
  last_heartbeat_at TEXT,
  next_heartbeat_at TEXT,
  is_paused INTEGER,
  affective_state TEXT
);

CREATE TABLE IF NOT EXISTS maintenance_state (
  id INTEGER PRIMARY KEY CHECK (id = 1),
  last_maintenance_at TEXT,
  is_paused INTEGER,
  updated_at TEXT
);

CREATE TABLE IF NOT EXISTS heartbeat_config (key TEXT PRIMARY KEY, value TEXT);
CREATE TABLE IF NOT EXISTS maintenance_config (key TEXT PRIMARY KEY, value TEXT);
CREATE TABLE IF NOT EXISTS config (key TEXT PRIMARY KEY, value TEXT);

CREATE TABLE IF NOT EXISTS heartbeat_log (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  heartbeat_number INTEGER NOT NULL,
  started_at TEXT NOT NULL,
  ended_at TEXT,
  energy_start REAL,
  energy_end REAL,
  narrative TEXT,
  emotional_valence REAL,
  actions_taken TEXT,
  decision_reasoning TEXT
);
CREATE INDEX IF NOT EXISTS idx_heartbeat_log_started ON heartbeat_log(started_at);

CREATE TABLE IF NOT EXISTS maintenance_log (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  ran_at TEXT NOT NULL,
  neighborhoods_recomputed INTEGER,
  embedding_cache_deleted INTEGER,
  working_memory_deleted INTEGER,
  working_memory_promoted INTEGER
);

CREATE TABLE IF NOT EXISTS external_calls (
  id TEXT PRIMARY KEY,
  status TEXT NOT NULL DEFAULT 'pending',
  output TEXT,
  created_at TEXT
);

CREATE TABLE IF NOT EXISTS drives (
  name TEXT PRIMARY KEY,
  current_level REAL NOT NULL DEFAULT 0,
  baseline REAL NOT NULL DEFAULT 0,
  urgency_threshold REAL NOT NULL DEFAULT 0,
  last_satisfied TEXT
);

CREATE TABLE IF NOT EXISTS goals (
  id TEXT PRIMARY KEY,
  title TEXT NOT NULL,
  description TEXT,
  priority TEXT NOT NULL DEFAULT 'queued',
  source TEXT,
  due_at TEXT,
  last_touched TEXT,
  progress TEXT,
  blocked_by TEXT,
  metrics TEXT,
  created_at TEXT
);

CREATE TABLE IF NOT EXISTS outbox_messages (
  id TEXT PRIMARY KEY,
  kind TEXT NOT NULL,
  payload TEXT,
  status TEXT NOT NULL DEFAULT 'pending',
  created_at TEXT NOT NULL,
  sent_at TEXT,
  seen_at TEXT
);

CREATE TABLE IF NOT EXISTS inbox_messages (
  id TEXT PRIMARY KEY,
  content TEXT NOT NULL,
  in_reply_to TEXT,
  tone TEXT NOT NULL,
  emotional_valence REAL NOT NULL,
  importance REAL NOT NULL,
  created_at TEXT NOT NULL,
  processed_at TEXT,
  memory_id TEXT
);

CREATE TABLE IF NOT EXISTS identity_aspects (
  id TEXT PRIMARY KEY,
  aspect_type TEXT NOT NULL,
  content TEXT,
  stability REAL NOT NULL DEFAULT 0,
  updated_at TEXT
);

CREATE TABLE IF NOT EXISTS worldview_primitives (
  id TEXT PRIMARY KEY,
  category TEXT NOT NULL,
  belief TEXT NOT NULL,
  confidence REAL,
  emotional_valence REAL,
  stability_score REAL,
  created_at TEXT
);

CREATE TABLE IF NOT EXISTS concepts (
  id TEXT PRIMARY KEY,
  name TEXT NOT NULL,
  ancestors TEXT,
  depth INTEGER NOT NULL DEFAULT 0,
  description TEXT
);

CREATE TABLE IF NOT EXISTS memory_concepts (
  memory_id TEXT NOT NULL,
  concept_id TEXT NOT NULL,
  PRIMARY KEY (memory_id, concept_id)
);

CREATE VIEW IF NOT EXISTS cognitive_health AS
SELECT
  (SELECT COUNT(*) FROM external_calls WHERE status = 'pending') AS pending_calls,
  (SELECT COUNT(*) FROM goals WHERE priority = 'active' AND blocked_by IS NOT NULL) AS blocked_goals;

CREATE VIEW IF NOT EXISTS goals_snapshot AS
SELECT json_object(
  'active', json((
    SELECT json_group_array(json_object(
      'id', id,
      'title', title,
      'description', description,
      'due_at', due_at,
      'last_touched', last_touched,
      'progress_count', CASE WHEN json_valid(progress) THEN json_array_length(progress) ELSE 0 END,
      'blocked_by', blocked_by,
      'metrics', CASE WHEN json_valid(metrics) THEN json(metrics) ELSE NULL END
    ))
    FROM (SELECT * FROM goals WHERE priority = 'active' ORDER BY last_touched DESC, id)
  )),
  'queued', json((
    SELECT json_group_array(json_object(
      'id', id, 'title', title, 'source', source, 'due_at', due_at
    ))
    FROM (SELECT * FROM goals WHERE priority = 'queued' ORDER BY created_at, id)
  )),
  'issues', json((
    SELECT json_group_array(json_object(
      'goal_id', id,
      'title', title,
      'issue', CASE
        WHEN due_at IS NOT NULL AND julianday(due_at) < julianday('now') THEN 'overdue'
        ELSE 'stale'
      END,
      'due_at', due_at,
      'days_since_touched', CAST(julianday('now') - julianday(last_touched) AS INTEGER)
    ))
    FROM goals
    WHERE priority = 'active'
      AND ((due_at IS NOT NULL AND julianday(due_at) < julianday('now'))
        OR (last_touched IS NOT NULL AND julianday('now') - julianday(last_touched) > 7))
  )),
  'counts', json_object(
    'active', (SELECT COUNT(*) FROM goals WHERE priority = 'active'),
    'queued', (SELECT COUNT(*) FROM goals WHERE priority = 'queued'),
    'backburner', (SELECT COUNT(*) FROM goals WHERE priority = 'backburner')
  )
) AS snapshot;
"#;
