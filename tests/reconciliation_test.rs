mod common;

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter};
use tokio::sync::mpsc;
use uuid::Uuid;

use common::{seed_booth_stock, seed_ingredient, seed_menu_item, TestApp};
use marketbooth_api::{
    auth::AuthUser,
    entities::{accounting_transaction, sale, stock_movement},
    realtime::ChannelKey,
    services::{
        reconciliation::SaleLine,
        sales::{CreateSaleInput, PaymentMethod, SaleLineInput, UpdateSaleInput},
    },
};

fn auth_user(model: &marketbooth_api::entities::user::Model) -> AuthUser {
    AuthUser {
        user_id: model.id,
        name: model.name.clone(),
        role: model.role.parse().expect("bad role"),
        brand_id: model.brand_id,
        booth_id: model.booth_id,
        token_id: "test".to_string(),
    }
}

async fn insert_sale(app: &TestApp, total: Decimal) -> sale::Model {
    let now = Utc::now();
    sale::ActiveModel {
        id: Set(Uuid::new_v4()),
        brand_id: Set(app.brand.id),
        booth_id: Set(app.booth.id),
        cashier_id: Set(app.staff.id),
        total_amount: Set(total),
        payment_method: Set("cash".to_string()),
        payment_status: Set("paid".to_string()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&*app.state.db)
    .await
    .expect("sale insert failed")
}

async fn sale_transaction(
    app: &TestApp,
    sale_id: Uuid,
) -> Option<accounting_transaction::Model> {
    accounting_transaction::Entity::find()
        .filter(accounting_transaction::Column::RelatedId.eq(sale_id))
        .filter(accounting_transaction::Column::RelatedType.eq("sale"))
        .one(&*app.state.db)
        .await
        .unwrap()
}

/// The full terminal flow from the sales service: 2x Pad Thai at 150 g
/// of noodles per plate against a 1000 g allocation, then edited down
/// to 1x, then deleted.
#[tokio::test]
async fn pad_thai_create_edit_delete_round_trip() {
    let app = TestApp::new().await;
    let admin = auth_user(&app.admin);

    let noodles = seed_ingredient(
        &app.state,
        app.brand.id,
        "rice noodles",
        "g",
        dec!(5000),
        dec!(0),
    )
    .await;
    seed_booth_stock(&app.state, app.booth.id, noodles.id, dec!(1000)).await;
    let pad_thai = seed_menu_item(
        &app.state,
        app.brand.id,
        Some(app.booth.id),
        "Pad Thai",
        dec!(90),
        &[(noodles.id, dec!(150))],
    )
    .await;

    // Create: 2 plates -> 300 g used, 700 g remaining
    let created = app
        .state
        .services
        .sales
        .create(
            &admin,
            CreateSaleInput {
                booth_id: app.booth.id,
                items: vec![SaleLineInput {
                    menu_item_id: pad_thai.id,
                    quantity: 2,
                }],
                payment_method: PaymentMethod::Cash,
            },
        )
        .await
        .expect("sale creation failed");
    assert_eq!(created.sale.total_amount, dec!(180));

    app.wait_for(|| async {
        app.booth_stock(app.booth.id, noodles.id).await.used == dec!(300)
    })
    .await;
    let stock = app.booth_stock(app.booth.id, noodles.id).await;
    assert_eq!(stock.remaining, dec!(700));
    assert_eq!(stock.allocated, dec!(1000));

    app.wait_for(|| async { sale_transaction(&app, created.sale.id).await.is_some() })
        .await;
    let transaction = sale_transaction(&app, created.sale.id).await.unwrap();
    assert_eq!(transaction.amount, dec!(180));
    assert_eq!(transaction.kind, "income");
    assert_eq!(transaction.category, "sale_revenue");

    let use_movements = stock_movement::Entity::find()
        .filter(stock_movement::Column::SaleId.eq(created.sale.id))
        .all(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(use_movements.len(), 1);
    assert_eq!(use_movements[0].movement_type, "use");
    assert_eq!(use_movements[0].quantity, dec!(-300));

    // Edit: down to 1 plate -> 150 g used, 850 g remaining, the 150 g
    // net difference restored to the warehouse, total synced to 90
    app.state
        .services
        .sales
        .update(
            &admin,
            created.sale.id,
            UpdateSaleInput {
                items: vec![SaleLineInput {
                    menu_item_id: pad_thai.id,
                    quantity: 1,
                }],
                payment_method: None,
            },
        )
        .await
        .expect("sale edit failed");

    app.wait_for(|| async {
        app.booth_stock(app.booth.id, noodles.id).await.used == dec!(150)
    })
    .await;
    let stock = app.booth_stock(app.booth.id, noodles.id).await;
    assert_eq!(stock.remaining, dec!(850));
    assert_eq!(app.ingredient(noodles.id).await.stock, dec!(5150));

    app.wait_for(|| async {
        sale_transaction(&app, created.sale.id)
            .await
            .map(|t| t.amount == dec!(90))
            .unwrap_or(false)
    })
    .await;

    // Delete: everything restored, linked records gone, sale gone
    app.state
        .services
        .sales
        .delete(&admin, created.sale.id)
        .await
        .expect("sale delete failed");

    app.wait_for(|| async {
        sale::Entity::find_by_id(created.sale.id)
            .one(&*app.state.db)
            .await
            .unwrap()
            .is_none()
    })
    .await;

    let stock = app.booth_stock(app.booth.id, noodles.id).await;
    assert_eq!(stock.used, dec!(0));
    assert_eq!(stock.remaining, dec!(1000));
    assert_eq!(app.ingredient(noodles.id).await.stock, dec!(5300));

    assert!(sale_transaction(&app, created.sale.id).await.is_none());
    let tagged = stock_movement::Entity::find()
        .filter(stock_movement::Column::SaleId.eq(created.sale.id))
        .all(&*app.state.db)
        .await
        .unwrap();
    assert!(tagged.is_empty());

    // The restoration adjustment survives the cleanup
    let restorations = stock_movement::Entity::find()
        .filter(stock_movement::Column::MovementType.eq("adjustment"))
        .filter(stock_movement::Column::SaleId.is_null())
        .all(&*app.state.db)
        .await
        .unwrap();
    assert!(restorations
        .iter()
        .any(|m| m.quantity == dec!(150) && m.ingredient_id == noodles.id));
}

/// Editing a sale from items A to items B and back to A must leave
/// booth and warehouse stock numerically where they started.
#[tokio::test]
async fn edit_round_trip_is_lossless() {
    let app = TestApp::new().await;
    let recon = app.state.services.reconciliation.clone();

    let noodles =
        seed_ingredient(&app.state, app.brand.id, "noodles", "g", dec!(4000), dec!(0)).await;
    let tofu = seed_ingredient(&app.state, app.brand.id, "tofu", "g", dec!(2000), dec!(0)).await;
    seed_booth_stock(&app.state, app.booth.id, noodles.id, dec!(1000)).await;
    seed_booth_stock(&app.state, app.booth.id, tofu.id, dec!(500)).await;

    let pad_thai = seed_menu_item(
        &app.state,
        app.brand.id,
        None,
        "Pad Thai",
        dec!(90),
        &[(noodles.id, dec!(150)), (tofu.id, dec!(40))],
    )
    .await;
    let tofu_bowl = seed_menu_item(
        &app.state,
        app.brand.id,
        None,
        "Tofu Bowl",
        dec!(70),
        &[(tofu.id, dec!(120))],
    )
    .await;

    let sale = insert_sale(&app, dec!(180)).await;
    let items_a = vec![SaleLine {
        menu_item_id: pad_thai.id,
        quantity: 2,
    }];
    let items_b = vec![SaleLine {
        menu_item_id: tofu_bowl.id,
        quantity: 3,
    }];

    assert!(recon
        .apply_sale(&sale, &items_a, app.admin.id)
        .await
        .is_completed());

    let noodles_after_a = app.booth_stock(app.booth.id, noodles.id).await;
    let tofu_after_a = app.booth_stock(app.booth.id, tofu.id).await;
    let central_noodles_a = app.ingredient(noodles.id).await.stock;
    let central_tofu_a = app.ingredient(tofu.id).await.stock;

    assert!(recon
        .apply_sale_edit(&sale, &items_a, &items_b, app.admin.id)
        .await
        .is_completed());
    assert!(recon
        .apply_sale_edit(&sale, &items_b, &items_a, app.admin.id)
        .await
        .is_completed());

    let noodles_final = app.booth_stock(app.booth.id, noodles.id).await;
    let tofu_final = app.booth_stock(app.booth.id, tofu.id).await;
    assert_eq!(noodles_final.used, noodles_after_a.used);
    assert_eq!(noodles_final.remaining, noodles_after_a.remaining);
    assert_eq!(tofu_final.used, tofu_after_a.used);
    assert_eq!(tofu_final.remaining, tofu_after_a.remaining);
    assert_eq!(app.ingredient(noodles.id).await.stock, central_noodles_a);
    assert_eq!(app.ingredient(tofu.id).await.stock, central_tofu_a);
}

/// Consumption beyond the allocation saturates instead of erroring.
#[tokio::test]
async fn overconsumption_clamps_at_allocation() {
    let app = TestApp::new().await;
    let recon = app.state.services.reconciliation.clone();

    let rice = seed_ingredient(&app.state, app.brand.id, "rice", "g", dec!(1000), dec!(0)).await;
    seed_booth_stock(&app.state, app.booth.id, rice.id, dec!(100)).await;
    let bowl = seed_menu_item(
        &app.state,
        app.brand.id,
        None,
        "Rice Bowl",
        dec!(40),
        &[(rice.id, dec!(60))],
    )
    .await;

    let sale = insert_sale(&app, dec!(80)).await;
    let outcome = recon
        .apply_sale(
            &sale,
            &[SaleLine {
                menu_item_id: bowl.id,
                quantity: 2,
            }],
            app.admin.id,
        )
        .await;
    assert!(outcome.is_completed());

    let stock = app.booth_stock(app.booth.id, rice.id).await;
    assert_eq!(stock.used, dec!(100));
    assert_eq!(stock.remaining, dec!(0));
    // central warehouse stock is untouched by sale consumption
    assert_eq!(app.ingredient(rice.id).await.stock, dec!(1000));
}

/// Low-stock alerts fire exactly at `max(0.2 * allocated, minimum_stock)`.
#[tokio::test]
async fn low_stock_alert_threshold() {
    let app = TestApp::new().await;
    let recon = app.state.services.reconciliation.clone();

    let chili = seed_ingredient(&app.state, app.brand.id, "chili", "g", dec!(500), dec!(10)).await;
    seed_booth_stock(&app.state, app.booth.id, chili.id, dec!(100)).await;
    let dish = seed_menu_item(
        &app.state,
        app.brand.id,
        None,
        "Spicy Salad",
        dec!(50),
        &[(chili.id, dec!(10))],
    )
    .await;

    // Watch the brand channel
    let (tx, mut rx) = mpsc::channel(32);
    app.state.events.registry().register(
        ChannelKey::Brand(app.brand.id),
        app.brand.id,
        Uuid::new_v4(),
        tx,
    );

    let alerts = |rx: &mut mpsc::Receiver<std::sync::Arc<String>>| {
        let mut count = 0;
        while let Ok(payload) = rx.try_recv() {
            let event: serde_json::Value = serde_json::from_str(&payload).unwrap();
            if event["type"] == "low_stock_alert" {
                count += 1;
            }
        }
        count
    };

    // 7 units -> remaining 30 > threshold 20: no alert
    let sale = insert_sale(&app, dec!(350)).await;
    recon
        .apply_sale(
            &sale,
            &[SaleLine {
                menu_item_id: dish.id,
                quantity: 7,
            }],
            app.admin.id,
        )
        .await;
    assert_eq!(alerts(&mut rx), 0);

    // 1 more unit -> remaining 20 == max(0.2 * 100, 10): alert fires
    let sale = insert_sale(&app, dec!(50)).await;
    recon
        .apply_sale(
            &sale,
            &[SaleLine {
                menu_item_id: dish.id,
                quantity: 1,
            }],
            app.admin.id,
        )
        .await;
    assert_eq!(alerts(&mut rx), 1);
}

/// Editing a sale that (for whatever reason) lost its linked
/// transaction recreates it at the new total.
#[tokio::test]
async fn edit_recreates_missing_transaction() {
    let app = TestApp::new().await;
    let recon = app.state.services.reconciliation.clone();

    let noodles =
        seed_ingredient(&app.state, app.brand.id, "noodles", "g", dec!(1000), dec!(0)).await;
    seed_booth_stock(&app.state, app.booth.id, noodles.id, dec!(500)).await;
    let dish = seed_menu_item(
        &app.state,
        app.brand.id,
        None,
        "Noodle Soup",
        dec!(60),
        &[(noodles.id, dec!(100))],
    )
    .await;

    let sale = insert_sale(&app, dec!(120)).await;
    let items = vec![SaleLine {
        menu_item_id: dish.id,
        quantity: 2,
    }];

    assert!(sale_transaction(&app, sale.id).await.is_none());
    assert!(recon
        .apply_sale_edit(&sale, &items, &items, app.admin.id)
        .await
        .is_completed());

    let transaction = sale_transaction(&app, sale.id).await.expect("recreated");
    assert_eq!(transaction.amount, dec!(120));
}
