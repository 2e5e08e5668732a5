//! Checkout/inventory workflow tests against an in-memory database.
//!
//! These exercise the repository layer end to end: card mirroring, cart
//! staging, checkout atomicity, and listing creation.

use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use rhystic_core::{Email, Money, TradeId, UserId, Username};
use rhystic_market::db::{
    CardRepository, CartAdd, CheckoutError, MIGRATOR, RepositoryError, TradeRepository,
    UserRepository,
};
use rhystic_market::models::card::Card;
use rhystic_market::models::user::NewUser;

async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("connect in-memory database");

    MIGRATOR.run(&pool).await.expect("run migrations");

    pool
}

fn money(s: &str) -> Money {
    Money::parse(s).expect("valid amount")
}

fn sample_card(id: &str, name: &str, price: &str) -> Card {
    Card {
        id: id.to_owned(),
        name: name.to_owned(),
        oracle_text: "Sample rules text.".to_owned(),
        image_url: format!("https://cards.example/{id}.jpg"),
        mana_cost: "{1}{G}".to_owned(),
        price: money(price),
        rarity: "rare".to_owned(),
    }
}

async fn user_with_balance(pool: &SqlitePool, username: &str, balance: &str) -> UserId {
    let user = UserRepository::new(pool)
        .create(&NewUser {
            name: "Test User".to_owned(),
            username: Username::parse(username).expect("valid username"),
            email: Email::parse(&format!("{username}@example.com")).expect("valid email"),
            password_hash: "not-a-real-hash".to_owned(),
            balance: money(balance),
        })
        .await
        .expect("create user");

    user.id
}

async fn count(pool: &SqlitePool, sql: &str) -> i64 {
    sqlx::query_scalar(sql)
        .fetch_one(pool)
        .await
        .expect("count query")
}

async fn balance_of(pool: &SqlitePool, user_id: UserId) -> String {
    UserRepository::new(pool)
        .get_by_id(user_id)
        .await
        .expect("fetch user")
        .expect("user exists")
        .balance
        .to_string()
}

// =============================================================================
// EnsureCardKnown
// =============================================================================

#[tokio::test]
async fn ensure_card_known_is_idempotent() {
    let pool = test_pool().await;
    let cards = CardRepository::new(&pool);

    cards
        .ensure_known(&sample_card("abc", "Llanowar Elves", "0.25"))
        .await
        .expect("first insert");

    // Same identifier, different attributes: must not overwrite
    cards
        .ensure_known(&sample_card("abc", "Somebody Else", "9.99"))
        .await
        .expect("second insert is a no-op");

    assert_eq!(count(&pool, "SELECT COUNT(*) FROM cardinfo").await, 1);

    let stored = cards
        .get("abc")
        .await
        .expect("fetch card")
        .expect("card exists");
    assert_eq!(stored.name, "Llanowar Elves");
    assert_eq!(stored.price.to_string(), "0.25");
}

// =============================================================================
// AddToCart
// =============================================================================

#[tokio::test]
async fn add_to_cart_keeps_one_pair_and_counts_calls() {
    let pool = test_pool().await;
    let user = user_with_balance(&pool, "buyer", "50.00").await;

    CardRepository::new(&pool)
        .ensure_known(&sample_card("bolt", "Lightning Bolt", "7.50"))
        .await
        .expect("card known");

    let trades = TradeRepository::new(&pool);

    let first = trades
        .add_to_cart(user, "bolt", money("7.50"))
        .await
        .expect("first add");
    let CartAdd::Created(trade_id) = first else {
        panic!("first add should create a staging trade");
    };

    // A later quote does not retroactively change the queued price
    let second = trades
        .add_to_cart(user, "bolt", money("9.99"))
        .await
        .expect("second add");
    assert_eq!(
        second,
        CartAdd::Incremented {
            trade_id,
            quantity: 2
        }
    );

    assert_eq!(count(&pool, "SELECT COUNT(*) FROM trade").await, 1);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM cart").await, 1);

    let lines = trades.cart_for_user(user).await.expect("cart lines");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 2);
    assert_eq!(lines[0].unit_price.to_string(), "7.50");
    assert_eq!(lines[0].line_total().to_string(), "15.00");
}

#[tokio::test]
async fn staging_trades_are_not_browsable() {
    let pool = test_pool().await;
    let user = user_with_balance(&pool, "buyer", "50.00").await;

    CardRepository::new(&pool)
        .ensure_known(&sample_card("bolt", "Lightning Bolt", "7.50"))
        .await
        .expect("card known");

    let trades = TradeRepository::new(&pool);
    trades
        .add_to_cart(user, "bolt", money("7.50"))
        .await
        .expect("add to cart");

    // Cart staging trades carry no seller link, so the browse page skips them
    let listings = trades.list_with_sellers().await.expect("list trades");
    assert!(listings.is_empty());
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn checkout_moves_inventory_and_debits_balance() {
    let pool = test_pool().await;
    let user = user_with_balance(&pool, "buyer", "10.00").await;

    CardRepository::new(&pool)
        .ensure_known(&sample_card("bolt", "Lightning Bolt", "7.50"))
        .await
        .expect("card known");

    let trades = TradeRepository::new(&pool);
    let CartAdd::Created(trade_id) = trades
        .add_to_cart(user, "bolt", money("7.50"))
        .await
        .expect("add to cart")
    else {
        panic!("expected a new staging trade");
    };

    let receipt = trades.checkout(user, trade_id).await.expect("checkout");

    assert_eq!(receipt.card_id, "bolt");
    assert_eq!(receipt.quantity, 1);
    assert_eq!(receipt.total.to_string(), "7.50");
    assert_eq!(receipt.new_balance.to_string(), "2.50");

    // Inventory moved, staging rows gone, balance debited
    let owned = CardRepository::new(&pool)
        .owned_by(user)
        .await
        .expect("owned cards");
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].owned_count, 1);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM trade").await, 0);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM cart").await, 0);
    assert_eq!(balance_of(&pool, user).await, "2.50");
}

#[tokio::test]
async fn checkout_increments_existing_owned_count() {
    let pool = test_pool().await;
    let user = user_with_balance(&pool, "buyer", "100.00").await;

    let cards = CardRepository::new(&pool);
    cards
        .ensure_known(&sample_card("bolt", "Lightning Bolt", "7.50"))
        .await
        .expect("card known");
    cards.add_owned(user, "bolt", 3).await.expect("seed collection");

    let trades = TradeRepository::new(&pool);
    let CartAdd::Created(trade_id) = trades
        .add_to_cart(user, "bolt", money("7.50"))
        .await
        .expect("add to cart")
    else {
        panic!("expected a new staging trade");
    };
    trades
        .add_to_cart(user, "bolt", money("7.50"))
        .await
        .expect("increment");

    trades.checkout(user, trade_id).await.expect("checkout");

    let owned = cards.owned_by(user).await.expect("owned cards");
    assert_eq!(owned[0].owned_count, 5);
}

#[tokio::test]
async fn checkout_with_insufficient_funds_changes_nothing() {
    let pool = test_pool().await;
    let user = user_with_balance(&pool, "broke", "5.00").await;

    CardRepository::new(&pool)
        .ensure_known(&sample_card("bolt", "Lightning Bolt", "7.50"))
        .await
        .expect("card known");

    let trades = TradeRepository::new(&pool);
    let CartAdd::Created(trade_id) = trades
        .add_to_cart(user, "bolt", money("7.50"))
        .await
        .expect("add to cart")
    else {
        panic!("expected a new staging trade");
    };

    let err = trades
        .checkout(user, trade_id)
        .await
        .expect_err("must not go through");
    match err {
        CheckoutError::InsufficientFunds { balance, required } => {
            assert_eq!(balance.to_string(), "5.00");
            assert_eq!(required.to_string(), "7.50");
        }
        other => panic!("unexpected error: {other}"),
    }

    // All-or-nothing: every row is exactly as it was
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM user_to_card").await, 0);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM trade").await, 1);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM cart").await, 1);
    assert_eq!(balance_of(&pool, user).await, "5.00");
}

#[tokio::test]
async fn checkout_rejects_trades_outside_the_callers_cart() {
    let pool = test_pool().await;
    let buyer = user_with_balance(&pool, "buyer", "50.00").await;
    let other = user_with_balance(&pool, "other", "50.00").await;

    CardRepository::new(&pool)
        .ensure_known(&sample_card("bolt", "Lightning Bolt", "7.50"))
        .await
        .expect("card known");

    let trades = TradeRepository::new(&pool);
    let CartAdd::Created(trade_id) = trades
        .add_to_cart(buyer, "bolt", money("7.50"))
        .await
        .expect("add to cart")
    else {
        panic!("expected a new staging trade");
    };

    // Someone else's cart trade, and a trade that doesn't exist at all
    assert!(matches!(
        trades.checkout(other, trade_id).await,
        Err(CheckoutError::NotInCart)
    ));
    assert!(matches!(
        trades.checkout(buyer, TradeId::new(9999)).await,
        Err(CheckoutError::NotInCart)
    ));

    assert_eq!(count(&pool, "SELECT COUNT(*) FROM trade").await, 1);
    assert_eq!(balance_of(&pool, other).await, "50.00");
}

// =============================================================================
// RemoveFromCart
// =============================================================================

#[tokio::test]
async fn remove_from_cart_only_deletes_the_callers_trades() {
    let pool = test_pool().await;
    let owner = user_with_balance(&pool, "owner", "50.00").await;
    let attacker = user_with_balance(&pool, "attacker", "50.00").await;

    CardRepository::new(&pool)
        .ensure_known(&sample_card("bolt", "Lightning Bolt", "7.50"))
        .await
        .expect("card known");

    let trades = TradeRepository::new(&pool);
    let CartAdd::Created(trade_id) = trades
        .add_to_cart(owner, "bolt", money("7.50"))
        .await
        .expect("add to cart")
    else {
        panic!("expected a new staging trade");
    };

    // A guessed trade id that is not in the caller's cart is a no-op
    assert!(!trades
        .remove_from_cart(attacker, trade_id)
        .await
        .expect("attempted removal"));
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM trade").await, 1);

    // The owner can remove it, which also deletes the trade
    assert!(trades
        .remove_from_cart(owner, trade_id)
        .await
        .expect("owner removal"));
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM trade").await, 0);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM cart").await, 0);
}

// =============================================================================
// CreateTradeListing / ListTrades
// =============================================================================

#[tokio::test]
async fn create_listing_for_unseen_card_creates_all_three_rows() {
    let pool = test_pool().await;
    let seller = user_with_balance(&pool, "seller", "0.00").await;

    let card = sample_card("fresh", "Rhystic Study", "39.99");
    CardRepository::new(&pool)
        .ensure_known(&card)
        .await
        .expect("card known");

    let trades = TradeRepository::new(&pool);
    trades
        .create_listing(seller, &card.id, 2, money("35.00"))
        .await
        .expect("create listing");

    assert_eq!(count(&pool, "SELECT COUNT(*) FROM cardinfo").await, 1);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM trade").await, 1);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM user_to_trade").await, 1);

    let listings = trades.list_with_sellers().await.expect("list trades");
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].card_name, "Rhystic Study");
    assert_eq!(listings[0].seller.as_str(), "seller");
    assert_eq!(listings[0].quantity, 2);
    assert_eq!(listings[0].price.to_string(), "35.00");
}

#[tokio::test]
async fn list_trades_orders_newest_first() {
    let pool = test_pool().await;
    let seller = user_with_balance(&pool, "seller", "0.00").await;

    let cards = CardRepository::new(&pool);
    cards
        .ensure_known(&sample_card("a", "Card A", "1.00"))
        .await
        .expect("card a");
    cards
        .ensure_known(&sample_card("b", "Card B", "2.00"))
        .await
        .expect("card b");

    let trades = TradeRepository::new(&pool);
    let first = trades
        .create_listing(seller, "a", 1, money("1.00"))
        .await
        .expect("first listing");
    let second = trades
        .create_listing(seller, "b", 1, money("2.00"))
        .await
        .expect("second listing");

    let listings = trades.list_with_sellers().await.expect("list trades");
    assert_eq!(listings.len(), 2);
    assert_eq!(listings[0].id, second);
    assert_eq!(listings[1].id, first);
}

// =============================================================================
// Users
// =============================================================================

#[tokio::test]
async fn duplicate_usernames_are_rejected() {
    let pool = test_pool().await;
    user_with_balance(&pool, "johndoe", "10.00").await;

    let err = UserRepository::new(&pool)
        .create(&NewUser {
            name: "Impostor".to_owned(),
            username: Username::parse("johndoe").expect("valid username"),
            email: Email::parse("other@example.com").expect("valid email"),
            password_hash: "not-a-real-hash".to_owned(),
            balance: Money::ZERO,
        })
        .await
        .expect_err("duplicate username must fail");

    assert!(matches!(err, RepositoryError::Conflict(_)));
}
