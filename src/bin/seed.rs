use foodbee::{
    config::AppConfig,
    db::create_orm_conn,
    middleware::auth::{ROLE_ADMIN, ROLE_SHOP},
    services::auth_service::hash_password,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    let pool = orm.get_postgres_connection_pool();
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(pool).await?;

    seed_postcodes(pool).await?;
    let admin_id = ensure_user(pool, "admin@foodbee.dk", "admin12345", ROLE_ADMIN).await?;
    let owner_id = ensure_user(pool, "bager@foodbee.dk", "bager12345", ROLE_SHOP).await?;
    let shop_id = ensure_shop(pool, owner_id).await?;
    seed_variants(pool).await?;
    seed_products(pool, shop_id).await?;

    println!("Seed completed. Admin ID: {admin_id}, shop ID: {shop_id}");
    Ok(())
}

async fn seed_postcodes(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let postcodes = [
        ("1050", "København K"),
        ("2100", "København Ø"),
        ("5000", "Odense C"),
        ("8000", "Aarhus C"),
        ("9000", "Aalborg"),
    ];
    for (postcode, city) in postcodes {
        sqlx::query(
            r#"
            INSERT INTO postcodes (postcode, city)
            VALUES ($1, $2)
            ON CONFLICT (postcode) DO NOTHING
            "#,
        )
        .bind(postcode)
        .bind(city)
        .execute(pool)
        .await?;
    }
    println!("Seeded postcodes");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role, is_active)
        VALUES ($1, $2, $3, $4, TRUE)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role, is_active = TRUE
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(row.0)
}

async fn ensure_shop(pool: &sqlx::PgPool, owner_id: Uuid) -> anyhow::Result<i32> {
    let row: (i32,) = sqlx::query_as(
        r#"
        INSERT INTO shops (user_id, name, address, postcode_id, homepage, email, phone, cvr_number, active)
        SELECT $1, 'Bageriet', 'Vestergade 1', id, 'https://bageriet.example', 'bager@foodbee.dk', '86123456', '12345678', TRUE
        FROM postcodes WHERE postcode = '8000'
        ON CONFLICT (user_id) DO UPDATE SET active = TRUE
        RETURNING id
        "#,
    )
    .bind(owner_id)
    .fetch_one(pool)
    .await?;
    println!("Ensured shop Bageriet");
    Ok(row.0)
}

async fn seed_variants(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    for color in ["Lys", "Mørk"] {
        sqlx::query(
            "INSERT INTO product_colors (name) SELECT $1 WHERE NOT EXISTS (SELECT 1 FROM product_colors WHERE name = $1)",
        )
        .bind(color)
        .execute(pool)
        .await?;
    }
    for size in ["Lille", "Stor"] {
        sqlx::query(
            "INSERT INTO product_sizes (name) SELECT $1 WHERE NOT EXISTS (SELECT 1 FROM product_sizes WHERE name = $1)",
        )
        .bind(size)
        .execute(pool)
        .await?;
    }
    println!("Seeded colors and sizes");
    Ok(())
}

async fn seed_products(pool: &sqlx::PgPool, shop_id: i32) -> anyhow::Result<()> {
    let products = vec![
        ("Rugbrød", "Surdejsrugbrød med kerner", "42.00", None),
        ("Kanelsnegl", "Bagt hver morgen", "18.00", Some("15.00")),
        ("Hindbærsnitte", "Med glasur og drys", "16.50", None),
    ];

    for (name, desc, price, offer) in products {
        let price: rust_decimal::Decimal = price.parse()?;
        let offer = offer.map(str::parse::<rust_decimal::Decimal>).transpose()?;
        sqlx::query(
            r#"
            INSERT INTO products (shop_id, name, description, price, offer_price)
            SELECT $1, $2, $3, $4, $5
            WHERE NOT EXISTS (SELECT 1 FROM products WHERE shop_id = $1 AND name = $2)
            "#,
        )
        .bind(shop_id)
        .bind(name)
        .bind(desc)
        .bind(price)
        .bind(offer)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
