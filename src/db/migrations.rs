use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::{info, warn};

use crate::auth::password;
use crate::db::models::{NewProduct, NewUser};
use crate::db::schema::{products, users};
use crate::error::{ApiResult, StartupError};
use crate::models::{ProductCategory, Role};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_EMAIL: &str = "admin@agromanage.com";
pub const ADMIN_PASSWORD: &str = "admin123";

struct SampleProduct {
    name: &'static str,
    category: ProductCategory,
    price: f64,
    stock: i32,
    image_url: &'static str,
    description: &'static str,
}

const SAMPLE_PRODUCTS: &[SampleProduct] = &[
    SampleProduct {
        name: "Organic Fertilizer",
        category: ProductCategory::Fertilizers,
        price: 499.99,
        stock: 100,
        image_url: "https://images.unsplash.com/photo-1585314062340-f1a5a7c9328d?w=500",
        description: "High-quality organic fertilizer for better crop yield",
    },
    SampleProduct {
        name: "Hybrid Tomato Seeds",
        category: ProductCategory::Seeds,
        price: 199.99,
        stock: 50,
        image_url: "https://images.unsplash.com/photo-1592841200221-a6898f307baa?w=500",
        description: "Disease-resistant hybrid tomato seeds",
    },
    SampleProduct {
        name: "Natural Pesticide",
        category: ProductCategory::Pesticides,
        price: 299.99,
        stock: 75,
        image_url: "https://images.unsplash.com/photo-1586771107445-d3ca888129ff?w=500",
        description: "Eco-friendly pesticide for pest control",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub admin_created: bool,
    pub products_created: usize,
}

/// Applies every migration not yet recorded in `__diesel_schema_migrations`.
pub fn run_migrations(conn: &mut PgConnection) -> Result<usize, StartupError> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| StartupError::Migration(e.to_string()))?;
    info!(count = applied.len(), "applied pending migrations");
    Ok(applied.len())
}

/// Drops every table by reverting all migrations, then re-applies them.
/// Destroys all data; only meant for disposable development databases.
pub fn reset_database(conn: &mut PgConnection) -> Result<usize, StartupError> {
    warn!("resetting database: all tables will be dropped and recreated");
    conn.revert_all_migrations(MIGRATIONS)
        .map_err(|e| StartupError::Migration(e.to_string()))?;
    run_migrations(conn)
}

/// Inserts the admin account and the sample catalog. Rows that already exist
/// are left alone; any other failure is returned.
pub fn seed(conn: &mut PgConnection) -> ApiResult<SeedReport> {
    let admin = NewUser {
        username: ADMIN_USERNAME.to_string(),
        email: ADMIN_EMAIL.to_string(),
        password: password::hash_password(ADMIN_PASSWORD)?,
        role: Role::Admin.as_str().to_string(),
    };
    let admin_created = diesel::insert_into(users::table)
        .values(&admin)
        .on_conflict_do_nothing()
        .execute(conn)?
        > 0;

    let mut products_created = 0;
    for sample in SAMPLE_PRODUCTS {
        let product = NewProduct {
            name: sample.name.to_string(),
            category: sample.category.as_str().to_string(),
            price: sample.price,
            stock: sample.stock,
            image_url: Some(sample.image_url.to_string()),
            description: Some(sample.description.to_string()),
        };
        products_created += diesel::insert_into(products::table)
            .values(&product)
            .on_conflict_do_nothing()
            .execute(conn)?;
    }

    info!(admin_created, products_created, "seed data checked");
    Ok(SeedReport {
        admin_created,
        products_created,
    })
}
