use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use marketbooth_api::{
    api_v1_routes,
    auth::{AuthService, Role},
    config::AppConfig,
    db::{establish_connection_with_config, run_migrations, DbConfig},
    entities::{booth, booth_stock, brand, ingredient, menu_item, menu_item_ingredient, user},
    AppState,
};

const TEST_JWT_SECRET: &str = "test_secret_key_that_is_long_enough_for_validation_rules";
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Test harness: application state over a single-connection in-memory
/// SQLite database with migrations applied and a seeded tenant.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub brand: brand::Model,
    pub booth: booth::Model,
    pub admin: user::Model,
    pub admin_token: String,
    pub staff: user::Model,
    pub staff_token: String,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_config = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let db = establish_connection_with_config(&db_config)
            .await
            .expect("failed to open test database");
        run_migrations(&db).await.expect("migrations failed");

        let cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_JWT_SECRET.to_string(),
            "test".to_string(),
        );
        let state = AppState::new(Arc::new(db), cfg);
        let router = Router::new()
            .nest("/api/v1", api_v1_routes(&state))
            .with_state(state.clone());

        let brand = seed_brand(&state, "Thai Street Kitchen").await;
        let booth = seed_booth(&state, brand.id, "Night Market Booth").await;
        let admin = seed_user(&state, Role::Admin, Some(brand.id), None, "admin@test.dev").await;
        let staff = seed_user(
            &state,
            Role::Staff,
            Some(brand.id),
            Some(booth.id),
            "staff@test.dev",
        )
        .await;

        let admin_token = state
            .auth
            .generate_token(&admin)
            .expect("token generation failed")
            .access_token;
        let staff_token = state
            .auth
            .generate_token(&staff)
            .expect("token generation failed")
            .access_token;

        Self {
            router,
            state,
            brand,
            booth,
            admin,
            admin_token,
            staff,
            staff_token,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("request failed");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body read failed")
            .to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    /// Polls until `check` passes, for effects applied by spawned
    /// reconciliation tasks.
    pub async fn wait_for<F, Fut>(&self, mut check: F)
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        for _ in 0..100 {
            if check().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached within timeout");
    }

    pub async fn booth_stock(&self, booth_id: Uuid, ingredient_id: Uuid) -> booth_stock::Model {
        booth_stock::Entity::find()
            .filter(booth_stock::Column::BoothId.eq(booth_id))
            .filter(booth_stock::Column::IngredientId.eq(ingredient_id))
            .one(&*self.state.db)
            .await
            .unwrap()
            .expect("booth stock entry missing")
    }

    pub async fn ingredient(&self, ingredient_id: Uuid) -> ingredient::Model {
        ingredient::Entity::find_by_id(ingredient_id)
            .one(&*self.state.db)
            .await
            .unwrap()
            .expect("ingredient missing")
    }
}

pub async fn seed_brand(state: &AppState, name: &str) -> brand::Model {
    let now = Utc::now();
    brand::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        active: Set(true),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&*state.db)
    .await
    .expect("brand insert failed")
}

pub async fn seed_booth(state: &AppState, brand_id: Uuid, name: &str) -> booth::Model {
    let now = Utc::now();
    booth::ActiveModel {
        id: Set(Uuid::new_v4()),
        brand_id: Set(brand_id),
        name: Set(name.to_string()),
        location: Set(None),
        active: Set(true),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&*state.db)
    .await
    .expect("booth insert failed")
}

pub async fn seed_user(
    state: &AppState,
    role: Role,
    brand_id: Option<Uuid>,
    booth_id: Option<Uuid>,
    email: &str,
) -> user::Model {
    let now = Utc::now();
    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set(AuthService::hash_password(TEST_PASSWORD).unwrap()),
        name: Set(email.split('@').next().unwrap_or("user").to_string()),
        role: Set(role.to_string()),
        brand_id: Set(brand_id),
        booth_id: Set(booth_id),
        active: Set(true),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&*state.db)
    .await
    .expect("user insert failed")
}

pub async fn seed_ingredient(
    state: &AppState,
    brand_id: Uuid,
    name: &str,
    unit: &str,
    stock: Decimal,
    minimum_stock: Decimal,
) -> ingredient::Model {
    let now = Utc::now();
    ingredient::ActiveModel {
        id: Set(Uuid::new_v4()),
        brand_id: Set(brand_id),
        name: Set(name.to_string()),
        unit: Set(unit.to_string()),
        cost_per_unit: Set(Decimal::ZERO),
        stock: Set(stock),
        minimum_stock: Set(minimum_stock),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&*state.db)
    .await
    .expect("ingredient insert failed")
}

/// Menu item plus its recipe lines
pub async fn seed_menu_item(
    state: &AppState,
    brand_id: Uuid,
    booth_id: Option<Uuid>,
    name: &str,
    price: Decimal,
    recipe: &[(Uuid, Decimal)],
) -> menu_item::Model {
    let now = Utc::now();
    let item = menu_item::ActiveModel {
        id: Set(Uuid::new_v4()),
        brand_id: Set(brand_id),
        booth_id: Set(booth_id),
        name: Set(name.to_string()),
        price: Set(price),
        active: Set(true),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&*state.db)
    .await
    .expect("menu item insert failed");

    for (ingredient_id, quantity_per_unit) in recipe {
        menu_item_ingredient::ActiveModel {
            id: Set(Uuid::new_v4()),
            menu_item_id: Set(item.id),
            ingredient_id: Set(*ingredient_id),
            quantity_per_unit: Set(*quantity_per_unit),
        }
        .insert(&*state.db)
        .await
        .expect("recipe insert failed");
    }

    item
}

/// Booth stock entry with the given allocation and nothing used yet
pub async fn seed_booth_stock(
    state: &AppState,
    booth_id: Uuid,
    ingredient_id: Uuid,
    allocated: Decimal,
) -> booth_stock::Model {
    booth_stock::ActiveModel {
        id: Set(Uuid::new_v4()),
        booth_id: Set(booth_id),
        ingredient_id: Set(ingredient_id),
        allocated: Set(allocated),
        used: Set(Decimal::ZERO),
        remaining: Set(allocated),
        updated_at: Set(Utc::now().into()),
    }
    .insert(&*state.db)
    .await
    .expect("booth stock insert failed")
}
