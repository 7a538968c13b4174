use sqlx::SqlitePool;
use tracing::info;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS students (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        student_code TEXT NOT NULL UNIQUE,
        department TEXT,
        created_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS courses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT,
        is_active BOOLEAN NOT NULL DEFAULT 1,
        created_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS course_sections (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        course_id INTEGER NOT NULL REFERENCES courses(id),
        title TEXT NOT NULL,
        order_index INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS course_materials (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        section_id INTEGER NOT NULL REFERENCES course_sections(id),
        title TEXT NOT NULL,
        content_type TEXT NOT NULL,
        order_index INTEGER NOT NULL,
        created_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS enrollments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        student_id INTEGER NOT NULL REFERENCES students(id),
        course_id INTEGER NOT NULL REFERENCES courses(id),
        status TEXT NOT NULL DEFAULT 'active',
        enrolled_at INTEGER NOT NULL,
        completed_at INTEGER,
        UNIQUE (student_id, course_id)
    )",
    "CREATE TABLE IF NOT EXISTS student_progress (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        student_id INTEGER NOT NULL REFERENCES students(id),
        course_id INTEGER NOT NULL REFERENCES courses(id),
        section_id INTEGER NOT NULL REFERENCES course_sections(id),
        material_id INTEGER NOT NULL REFERENCES course_materials(id),
        is_completed BOOLEAN NOT NULL DEFAULT 0,
        completed_at INTEGER,
        UNIQUE (student_id, material_id)
    )",
    "CREATE TABLE IF NOT EXISTS enrollment_milestones (
        student_id INTEGER NOT NULL,
        course_id INTEGER NOT NULL,
        milestone INTEGER NOT NULL,
        reached_at INTEGER NOT NULL,
        PRIMARY KEY (student_id, course_id, milestone)
    )",
    "CREATE TABLE IF NOT EXISTS wallets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        student_id INTEGER NOT NULL REFERENCES students(id),
        wallet_address TEXT NOT NULL UNIQUE,
        is_primary BOOLEAN NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS transactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        wallet_address TEXT NOT NULL,
        transaction_type TEXT NOT NULL,
        amount INTEGER NOT NULL,
        description TEXT NOT NULL,
        tx_hash TEXT,
        block_number INTEGER,
        created_at INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_sections_course ON course_sections(course_id)",
    "CREATE INDEX IF NOT EXISTS idx_materials_section ON course_materials(section_id)",
    "CREATE INDEX IF NOT EXISTS idx_progress_student_course ON student_progress(student_id, course_id)",
    "CREATE INDEX IF NOT EXISTS idx_enrollments_course ON enrollments(course_id)",
    "CREATE INDEX IF NOT EXISTS idx_wallets_student ON wallets(student_id)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_wallets_one_primary ON wallets(student_id) WHERE is_primary = 1",
    "CREATE INDEX IF NOT EXISTS idx_transactions_wallet_time ON transactions(wallet_address, created_at)",
];

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");

    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("Database migrations completed successfully");
    Ok(())
}
