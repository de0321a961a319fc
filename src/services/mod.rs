use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::realtime::EventBroadcaster;

pub mod accounting;
pub mod booth_stock;
pub mod booths;
pub mod brands;
pub mod ingredients;
pub mod menu;
pub mod reconciliation;
pub mod sales;
pub mod stock_movements;
pub mod users;

use reconciliation::{ReconciliationService, StockLocks};

/// Aggregated application services shared through the router state
#[derive(Clone)]
pub struct AppServices {
    pub accounting: Arc<accounting::AccountingService>,
    pub booth_stock: Arc<booth_stock::BoothStockService>,
    pub booths: Arc<booths::BoothService>,
    pub brands: Arc<brands::BrandService>,
    pub ingredients: Arc<ingredients::IngredientService>,
    pub menu: Arc<menu::MenuService>,
    pub reconciliation: Arc<ReconciliationService>,
    pub sales: Arc<sales::SaleService>,
    pub stock_movements: Arc<stock_movements::StockMovementService>,
    pub users: Arc<users::UserService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        events: Arc<EventBroadcaster>,
        menu_events: Arc<EventBroadcaster>,
    ) -> Self {
        let locks = Arc::new(StockLocks::new());
        let reconciliation = Arc::new(ReconciliationService::new(
            db.clone(),
            events.clone(),
            locks.clone(),
        ));

        Self {
            accounting: Arc::new(accounting::AccountingService::new(db.clone())),
            booth_stock: Arc::new(booth_stock::BoothStockService::new(
                db.clone(),
                events.clone(),
                locks,
            )),
            booths: Arc::new(booths::BoothService::new(db.clone())),
            brands: Arc::new(brands::BrandService::new(db.clone())),
            ingredients: Arc::new(ingredients::IngredientService::new(db.clone())),
            menu: Arc::new(menu::MenuService::new(db.clone(), menu_events)),
            sales: Arc::new(sales::SaleService::new(
                db.clone(),
                events,
                reconciliation.clone(),
            )),
            stock_movements: Arc::new(stock_movements::StockMovementService::new(db.clone())),
            users: Arc::new(users::UserService::new(db)),
            reconciliation,
        }
    }
}
