//! SQL for both backends. Postgres tables are owned by the application database,
//! so only SQLite gets a bootstrap schema.

pub const SQLITE_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS categories (
        id INTEGER PRIMARY KEY,
        name TEXT UNIQUE NOT NULL,
        slug TEXT NOT NULL,
        description TEXT
    );

    CREATE TABLE IF NOT EXISTS tools (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        slug TEXT UNIQUE NOT NULL,
        url TEXT,
        description TEXT,
        tagline TEXT,
        category_id INTEGER,
        image_url TEXT,
        upvotes INTEGER NOT NULL DEFAULT 0,
        match_score REAL NOT NULL DEFAULT 0.0,
        status TEXT NOT NULL DEFAULT 'active',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        FOREIGN KEY(category_id) REFERENCES categories(id)
    );

    CREATE TABLE IF NOT EXISTS tool_cards (
        id INTEGER PRIMARY KEY,
        tool_id INTEGER UNIQUE NOT NULL,
        layout_type TEXT NOT NULL,
        card_size TEXT NOT NULL,
        display_order INTEGER NOT NULL,
        is_featured INTEGER NOT NULL,
        show_upvote_button INTEGER NOT NULL,
        show_category_badge INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        FOREIGN KEY(tool_id) REFERENCES tools(id)
    );
";

pub const SQLITE_INSERT_CATEGORY: &str =
    "INSERT INTO categories (name, slug, description)
     VALUES (?1, ?2, ?3)
     ON CONFLICT(name) DO NOTHING";

pub const SQLITE_UPSERT_TOOL: &str =
    "INSERT INTO tools (name, slug, url, description, tagline, category_id, image_url,
                        upvotes, match_score, status, created_at, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
     ON CONFLICT(slug) DO UPDATE SET
        url = excluded.url,
        description = excluded.description,
        tagline = excluded.tagline,
        category_id = excluded.category_id,
        image_url = excluded.image_url,
        updated_at = excluded.updated_at
     RETURNING id";

pub const SQLITE_INSERT_CARD: &str =
    "INSERT INTO tool_cards (tool_id, layout_type, card_size, display_order, is_featured,
                             show_upvote_button, show_category_badge, created_at, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
     ON CONFLICT DO NOTHING";

pub const PG_INSERT_CATEGORY: &str =
    "INSERT INTO categories (name, slug, description)
     VALUES ($1, $2, $3)
     ON CONFLICT (name) DO NOTHING";

pub const PG_SELECT_CATEGORIES: &str = "SELECT name, id::BIGINT FROM categories";

pub const PG_UPSERT_TOOL: &str =
    "INSERT INTO tools (name, slug, url, description, tagline, category_id, image_url,
                        upvotes, match_score, status, created_at, updated_at)
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
     ON CONFLICT (slug) DO UPDATE SET
        url = EXCLUDED.url,
        description = EXCLUDED.description,
        tagline = EXCLUDED.tagline,
        category_id = EXCLUDED.category_id,
        image_url = EXCLUDED.image_url,
        updated_at = EXCLUDED.updated_at
     RETURNING id::BIGINT";

pub const PG_INSERT_CARD: &str =
    "INSERT INTO tool_cards (tool_id, layout_type, card_size, display_order, is_featured,
                             show_upvote_button, show_category_badge, created_at, updated_at)
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
     ON CONFLICT DO NOTHING";
