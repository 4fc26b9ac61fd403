use pantry_core::{Cart, ConflictPolicy, Product};
use pantry_db::{CartDatabase, DbConfig};

async fn open() -> CartDatabase {
    CartDatabase::new(DbConfig::in_memory(ConflictPolicy::Replace))
        .await
        .expect("open in-memory cart")
}

#[tokio::test]
async fn add_products_to_cart() {
    let db = open().await;
    let pears = Product::new(3, "Pears", 0.8, "fruit");
    let leeks = Product::new(7, "Leeks", 1.2, "vegetable");

    db.cart_items()
        .insert(&Cart::from_product(&pears, 5))
        .await
        .unwrap();
    db.cart_items()
        .insert(&Cart::from_product(&leeks, 2))
        .await
        .unwrap();

    let lines = db.cart_items().get_all().first().await.unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].name, "Pears");
    assert_eq!(lines[0].quantity, 5);
    assert_eq!(lines[1].id, 7);

    let total = db.cart_items().total().await.unwrap();
    assert!((total - 6.4).abs() < 1e-9);
}

#[tokio::test]
async fn replace_updates_quantity() {
    let db = open().await;
    let pears = Product::new(3, "Pears", 0.8, "fruit");

    db.cart_items()
        .insert(&Cart::from_product(&pears, 1))
        .await
        .unwrap();
    db.cart_items()
        .insert(&Cart::from_product(&pears, 4))
        .await
        .unwrap();

    let line = db.cart_items().get_by_id(3).first().await.unwrap().unwrap();
    assert_eq!(line.quantity, 4);
    assert_eq!(db.cart_items().count().await.unwrap(), 1);
}

#[tokio::test]
async fn clear_empties_cart() {
    let db = open().await;
    for id in 1..=3 {
        let line = Cart::new(id, format!("Item {id}"), 1.0, "fruit", 1);
        db.cart_items().insert(&line).await.unwrap();
    }

    assert_eq!(db.cart_items().clear().await.unwrap(), 3);
    assert!(db.cart_items().get_all().first().await.unwrap().is_empty());
    assert_eq!(db.cart_items().total().await.unwrap(), 0.0);
}
