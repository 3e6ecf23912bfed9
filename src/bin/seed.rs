use clap::Parser;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use rand::Rng;
use sqlx::sqlite::SqlitePoolOptions;

use shugibako::{
    domain::{CreateCoupleProfileRequest, CreateGiftItemRequest, CreateUserRequest},
    repository::{
        CoupleRepository, GiftItemRepository, GiftListRepository, SqliteCoupleRepository,
        SqliteGiftItemRepository, SqliteGiftListRepository, SqliteUserRepository, UserRepository,
    },
};

#[derive(Parser)]
#[command(about = "Seed the database with a demo couple and gift list")]
struct Args {
    /// Number of gift items to create
    #[arg(long, default_value_t = 5)]
    items: usize,
}

const DEMO_ITEMS: &[(&str, i64)] = &[
    ("ダイソン掃除機 V12", 69800),
    ("バルミューダ トースター", 27500),
    ("ル・クルーゼ ココット・ロンド", 33000),
    ("象印 炊飯器", 45000),
    ("ペアグラスセット", 8800),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("🌱 Starting database seeding...");

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:shugibako.db".to_string());

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    println!("📋 Running migrations...");
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    let user_repo = SqliteUserRepository::new(db_pool.clone());
    let couple_repo = SqliteCoupleRepository::new(db_pool.clone());
    let gift_list_repo = SqliteGiftListRepository::new(db_pool.clone());
    let gift_item_repo = SqliteGiftItemRepository::new(db_pool.clone());

    println!("👤 Creating demo user...");
    let user = user_repo
        .create(CreateUserRequest {
            email: SafeEmail().fake(),
            display_name: Name().fake(),
        })
        .await?;

    println!("💒 Creating couple profile...");
    let couple = couple_repo
        .create(
            CreateCoupleProfileRequest {
                user_id: user.id,
                partner_one_name: "太郎".to_string(),
                partner_two_name: "花子".to_string(),
                wedding_date: None,
                greeting: Some(
                    "この度、私たちは結婚式を挙げることになりました。".to_string(),
                ),
            },
            "w-demo".to_string(),
        )
        .await?;

    println!("  ✅ Public page slug: {}", couple.slug);

    println!("🎁 Creating gift list...");
    let list = gift_list_repo
        .create(
            couple.id,
            "新生活スタート応援リスト",
            "新生活で必要なものをまとめたご祝儀リストです。",
        )
        .await?;

    let mut rng = rand::thread_rng();
    for i in 0..args.items {
        let (name, target_amount) = if i < DEMO_ITEMS.len() {
            let (name, price) = DEMO_ITEMS[i];
            (name.to_string(), price)
        } else {
            (
                format!("ウィッシュリストアイテム {}", i + 1),
                rng.gen_range(30..=700) * 100,
            )
        };

        gift_item_repo
            .create(
                list.id,
                CreateGiftItemRequest {
                    name,
                    description: None,
                    target_amount: Some(target_amount),
                    product_url: None,
                    image_url: None,
                },
            )
            .await?;
    }

    println!("  ✅ Created {} gift items", args.items);
    println!("✨ Seeding complete!");
    println!("   Public page: /public/pages/{}", couple.slug);

    Ok(())
}
