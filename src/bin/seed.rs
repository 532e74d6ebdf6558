use asb_ban_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    middleware::auth::{ADMIN_ROLE, Claims, issue_token},
    services::slugify,
};
use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let admin_id = ensure_user(&pool, "admin@asb-ban.ir", "مدیر سایت", ADMIN_ROLE).await?;
    let user_id = ensure_user(&pool, "user@asb-ban.ir", "کاربر نمونه", "user").await?;
    seed_categories(&pool).await?;
    seed_products(&pool).await?;
    seed_providers(&pool, admin_id).await?;
    seed_competitions(&pool).await?;
    seed_posts(&pool, admin_id).await?;

    // Sign-in lives outside this service; print tokens for local testing.
    let expires = (Utc::now() + Duration::days(30)).timestamp() as usize;
    for (label, id, role) in [("admin", admin_id, ADMIN_ROLE), ("user", user_id, "user")] {
        let claims = Claims {
            sub: id.to_string(),
            role: role.to_string(),
            exp: expires,
        };
        println!("{label} token: {}", issue_token(&claims, &config.jwt_secret)?);
    }

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    full_name: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, full_name, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(full_name)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(id)
}

async fn seed_categories(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let blog = [
        ("نژادهای اسب", "horse-breeds"),
        ("بیماری‌ها و سلامت", "health-diseases"),
        ("تجهیزات و لوازم", "equipment"),
        ("ورزش‌های سوارکاری", "equestrian-sports"),
        ("تاریخ و فرهنگ", "history-culture"),
    ];
    let shop = [
        ("تجهیزات", "equipment"),
        ("داروها", "medicines"),
        ("مکمل‌های غذایی", "supplements"),
        ("وسایل مراقبت", "care-items"),
    ];

    for (table, rows) in [("blog_categories", &blog[..]), ("product_categories", &shop[..])] {
        for &(name, slug) in rows {
            sqlx::query(&format!(
                "INSERT INTO {table} (id, name, slug) VALUES ($1, $2, $3) ON CONFLICT (slug) DO NOTHING"
            ))
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(slug)
            .execute(pool)
            .await?;
        }
    }

    println!("Seeded blog and product categories");
    Ok(())
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let products = [
        ("زین چرمی سوارکاری", "زین دست‌دوز با چرم طبیعی", 18_500_000_i64, 12, "equipment"),
        ("افسار نایلونی", "افسار مقاوم در سایزهای مختلف", 950_000, 80, "equipment"),
        ("نعل فولادی", "بسته چهار عددی", 1_200_000, 150, "care-items"),
        ("مکمل غذایی اسب", "ویتامین و مواد معدنی، ۵ کیلوگرم", 3_400_000, 40, "supplements"),
    ];

    for (name, desc, price, stock, category) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, slug, description, price, stock_quantity, category_id)
            VALUES ($1, $2, $3, $4, $5, $6, (SELECT id FROM product_categories WHERE slug = $7))
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(slugify(name))
        .bind(desc)
        .bind(price)
        .bind(stock)
        .bind(category)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

async fn seed_providers(pool: &sqlx::PgPool, owner_id: Uuid) -> anyhow::Result<()> {
    let vets = [
        ("دکتر علی رضایی", "جراحی اسب", "تهران", 35.6892, 51.3890),
        ("دکتر مریم احمدی", "دندانپزشکی اسب", "اصفهان", 32.6546, 51.6680),
    ];
    for (name, specialization, region, lat, lng) in vets {
        sqlx::query(
            r#"
            INSERT INTO veterinarians
                (id, user_id, full_name, specialization, region, phone, latitude, longitude)
            SELECT $1, $2, $3, $4, $5, $6, $7, $8
            WHERE NOT EXISTS (SELECT 1 FROM veterinarians WHERE full_name = $3)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(name)
        .bind(specialization)
        .bind(region)
        .bind("09120000000")
        .bind(lat)
        .bind(lng)
        .execute(pool)
        .await?;
    }

    sqlx::query(
        r#"
        INSERT INTO horse_transporters
            (id, user_id, company_name, contact_name, phone, region, latitude, longitude)
        SELECT $1, $2, $3, $4, $5, $6, $7, $8
        WHERE NOT EXISTS (SELECT 1 FROM horse_transporters WHERE company_name = $3)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(owner_id)
    .bind("حمل اسب البرز")
    .bind("رضا کریمی")
    .bind("09121111111")
    .bind("کرج")
    .bind(35.8400)
    .bind(50.9391)
    .execute(pool)
    .await?;

    println!("Seeded service providers");
    Ok(())
}

async fn seed_competitions(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let competitions = [
        ("مسابقات پرش با اسب تهران", "show_jumping", "تهران", (2026, 11, 20), false),
        ("جام بین‌المللی استقامت", "endurance", "شیراز", (2027, 2, 14), true),
    ];
    for (title, kind, location, (y, m, d), international) in competitions {
        let Some(start) = NaiveDate::from_ymd_opt(y, m, d) else {
            continue;
        };
        sqlx::query(
            r#"
            INSERT INTO competitions
                (id, title, slug, competition_type, location, start_date, end_date, is_international)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(slugify(title))
        .bind(kind)
        .bind(location)
        .bind(start)
        .bind(start + Duration::days(2))
        .bind(international)
        .execute(pool)
        .await?;
    }

    println!("Seeded competitions");
    Ok(())
}

async fn seed_posts(pool: &sqlx::PgPool, author_id: Uuid) -> anyhow::Result<()> {
    let posts = [
        (
            "آشنایی با اسب عرب ایرانی",
            "horse-breeds",
            "یکی از قدیمی‌ترین نژادهای اسب جهان",
            "اسب عرب ایرانی به استقامت و هوش بالا شناخته می‌شود و در مسابقات استقامت جایگاه ویژه‌ای دارد.",
        ),
        (
            "مراقبت از سم اسب در زمستان",
            "health-diseases",
            "نکات ساده برای جلوگیری از ترک سم",
            "رطوبت و سرما سم را آسیب‌پذیر می‌کند؛ تمیز کردن روزانه و نعل‌بندی منظم را فراموش نکنید.",
        ),
    ];

    for (title, category, excerpt, content) in posts {
        sqlx::query(
            r#"
            INSERT INTO blog_posts
                (id, title, slug, excerpt, content, category_id, author_id, is_published, published_at)
            VALUES ($1, $2, $3, $4, $5, (SELECT id FROM blog_categories WHERE slug = $6), $7, TRUE, NOW())
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(slugify(title))
        .bind(excerpt)
        .bind(content)
        .bind(category)
        .bind(author_id)
        .execute(pool)
        .await?;
    }

    println!("Seeded blog posts");
    Ok(())
}
