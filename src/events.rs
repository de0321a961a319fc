use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

/// Event kinds pushed over the realtime channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RealtimeEventKind {
    StockUpdate,
    NewSale,
    LowStockAlert,
    MenuUpdate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Warning,
    Critical,
}

/// Ephemeral message pushed to connected clients. Never persisted; it
/// exists only on the wire between the broadcaster and open streams.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeEvent {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: RealtimeEventKind,
    pub data: serde_json::Value,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub brand_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booth_id: Option<Uuid>,
}

impl RealtimeEvent {
    fn new(
        kind: RealtimeEventKind,
        brand_id: Uuid,
        booth_id: Option<Uuid>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            data,
            timestamp: Utc::now().timestamp_millis(),
            brand_id,
            booth_id,
        }
    }

    /// Stock level change for one ingredient at one booth
    pub fn stock_update(
        brand_id: Uuid,
        booth_id: Uuid,
        ingredient_id: Uuid,
        ingredient_name: &str,
        old_quantity: Decimal,
        new_quantity: Decimal,
    ) -> Self {
        Self::new(
            RealtimeEventKind::StockUpdate,
            brand_id,
            Some(booth_id),
            json!({
                "ingredientId": ingredient_id,
                "ingredientName": ingredient_name,
                "oldQuantity": old_quantity,
                "newQuantity": new_quantity,
                "delta": new_quantity - old_quantity,
            }),
        )
    }

    /// A completed sale, with its full payload
    pub fn new_sale(brand_id: Uuid, booth_id: Uuid, sale: serde_json::Value) -> Self {
        Self::new(RealtimeEventKind::NewSale, brand_id, Some(booth_id), sale)
    }

    /// Low-stock warning; `critical` once the stock is fully exhausted
    pub fn low_stock_alert(
        brand_id: Uuid,
        booth_id: Option<Uuid>,
        ingredient_id: Uuid,
        ingredient_name: &str,
        current_stock: Decimal,
        minimum_stock: Decimal,
    ) -> Self {
        let severity = if current_stock.is_zero() {
            AlertSeverity::Critical
        } else {
            AlertSeverity::Warning
        };
        Self::new(
            RealtimeEventKind::LowStockAlert,
            brand_id,
            booth_id,
            json!({
                "ingredientId": ingredient_id,
                "ingredientName": ingredient_name,
                "currentStock": current_stock,
                "minimumStock": minimum_stock,
                "severity": severity,
            }),
        )
    }
}

/// Menu refresh message delivered over the menu channel, which is keyed
/// purely by client id and fanned out to every connected client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuEvent {
    #[serde(rename = "type")]
    pub kind: RealtimeEventKind,
    pub booth_id: Uuid,
    pub data: serde_json::Value,
    pub timestamp: i64,
}

impl MenuEvent {
    pub fn menu_update(booth_id: Uuid, items: serde_json::Value) -> Self {
        Self {
            kind: RealtimeEventKind::MenuUpdate,
            booth_id,
            data: items,
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn stock_update_carries_delta() {
        let brand = Uuid::new_v4();
        let booth = Uuid::new_v4();
        let event = RealtimeEvent::stock_update(
            brand,
            booth,
            Uuid::new_v4(),
            "noodles",
            dec!(700),
            dec!(550),
        );
        assert_eq!(event.kind, RealtimeEventKind::StockUpdate);
        assert_eq!(event.data["delta"], json!(dec!(-150)));
        assert_eq!(event.booth_id, Some(booth));
    }

    #[test]
    fn exhausted_stock_is_critical() {
        let event = RealtimeEvent::low_stock_alert(
            Uuid::new_v4(),
            None,
            Uuid::new_v4(),
            "noodles",
            dec!(0),
            dec!(10),
        );
        assert_eq!(event.data["severity"], json!("critical"));

        let event = RealtimeEvent::low_stock_alert(
            Uuid::new_v4(),
            None,
            Uuid::new_v4(),
            "noodles",
            dec!(5),
            dec!(10),
        );
        assert_eq!(event.data["severity"], json!("warning"));
    }

    #[test]
    fn wire_shape_is_camel_case() {
        let event = RealtimeEvent::new_sale(Uuid::new_v4(), Uuid::new_v4(), json!({"total": 10}));
        let value = serde_json::to_value(&event).unwrap();
        assert!(value.get("brandId").is_some());
        assert!(value.get("boothId").is_some());
        assert_eq!(value["type"], json!("new_sale"));
    }
}
