use std::collections::{HashMap, HashSet};

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};

use crate::entities::equipment::{self, EquipmentStatus};
use crate::error::{AppError, AppResult};

const MAX_NOTE_CHARS: usize = 255;

/// One requested piece of equipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentLine {
    pub equipment_id: i32,
    pub quantity: i32,
    #[serde(default)]
    pub note: Option<String>,
}

/// A validated line with the unit price frozen at validation time.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservedLine {
    pub equipment_id: i32,
    pub quantity: i32,
    pub note: Option<String>,
    pub unit_price: i64,
}

impl ReservedLine {
    pub fn subtotal(&self) -> i64 {
        self.unit_price * i64::from(self.quantity)
    }
}

/// Shape checks that need no stock lookup.
pub fn check_lines(lines: &[EquipmentLine]) -> AppResult<()> {
    let mut seen = HashSet::new();
    for line in lines {
        if line.quantity < 1 {
            return Err(AppError::InvalidArgument(format!(
                "Quantity for equipment {} must be at least 1",
                line.equipment_id
            )));
        }
        if !seen.insert(line.equipment_id) {
            return Err(AppError::InvalidArgument(format!(
                "Equipment {} is listed more than once",
                line.equipment_id
            )));
        }
        if line
            .note
            .as_ref()
            .is_some_and(|note| note.chars().count() > MAX_NOTE_CHARS)
        {
            return Err(AppError::InvalidArgument(format!(
                "Note for equipment {} exceeds {} characters",
                line.equipment_id, MAX_NOTE_CHARS
            )));
        }
    }
    Ok(())
}

/// Stock a request may draw on. Equipment out of service has none.
pub fn available_quantity(item: &equipment::Model) -> i32 {
    match item.status {
        EquipmentStatus::Available => item.available_quantity.max(0),
        EquipmentStatus::Unavailable | EquipmentStatus::Maintenance => 0,
    }
}

/// Validate requested equipment against the current stock snapshot.
///
/// Nothing is decremented: every occurrence of a recurring request is
/// checked against this same snapshot, and concurrent requests do not see
/// each other's demand.
pub async fn validate<C: ConnectionTrait>(
    conn: &C,
    lines: &[EquipmentLine],
) -> AppResult<Vec<ReservedLine>> {
    check_lines(lines)?;
    if lines.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i32> = lines.iter().map(|line| line.equipment_id).collect();
    let stock: HashMap<i32, equipment::Model> = equipment::Entity::find()
        .filter(equipment::Column::Id.is_in(ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|item| (item.id, item))
        .collect();

    lines
        .iter()
        .map(|line| {
            let item = stock.get(&line.equipment_id).ok_or_else(|| {
                AppError::NotFound(format!("Equipment {} not found", line.equipment_id))
            })?;

            let available = available_quantity(item);
            if line.quantity > available {
                return Err(AppError::Capacity {
                    equipment: item.name.clone(),
                    requested: line.quantity,
                    available,
                });
            }

            Ok(ReservedLine {
                equipment_id: item.id,
                quantity: line.quantity,
                note: line.note.clone(),
                unit_price: item.rental_price,
            })
        })
        .collect()
}
