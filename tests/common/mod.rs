//! Shared fixtures for the integration tests.
//!
//! Relationships:
//! - Customer has_one Profile (`customer.profile_id = profile.id`)
//! - Customer has_many Orders (`order.customer_id = customer.id`)
//! - Order has_many Items through `order_item`
//! - ScopedCustomer adds a default filter from its init hook

#![allow(dead_code)]

use lifeguard_activequery::{
    populate_models, unknown_relation, ActiveQuery, Filter, FromRow, LifeEntityName, LifeError, LifeModelTrait,
    ModelTrait, Params, RelationDef, Row,
};
use sea_query::Value;

// ============================================================================
// Customer
// ============================================================================

#[derive(Debug, Default, Clone, Copy)]
pub struct Customer;

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerModel {
    pub id: i32,
    pub name: String,
    pub profile_id: Option<i32>,
    pub profile: Option<ProfileModel>,
    pub orders: Vec<OrderModel>,
}

impl LifeEntityName for Customer {
    fn table_name(&self) -> &'static str {
        "customer"
    }
}

impl LifeModelTrait for Customer {
    type Model = CustomerModel;

    fn relation(&self, name: &str) -> Result<RelationDef, LifeError> {
        match name {
            "profile" => Ok(ActiveQuery::<Profile>::has_one([("id", "profile_id")]).into_relation(name)),
            "orders" => Ok(ActiveQuery::<Order>::has_many([("customer_id", "id")]).into_relation(name)),
            "active_orders" => Ok(ActiveQuery::<Order>::has_many([("customer_id", "id")])
                .on_condition(Filter::eq("status", 1), Params::new())
                .into_relation(name)),
            _ => Err(unknown_relation::<Self>(name)),
        }
    }
}

impl FromRow for CustomerModel {
    fn from_row(row: &Row) -> Result<Self, LifeError> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            profile_id: row.try_get("profile_id")?,
            profile: None,
            orders: Vec::new(),
        })
    }
}

impl ModelTrait for CustomerModel {
    fn populate_relation(&mut self, name: &str, rows: Vec<Row>) -> Result<(), LifeError> {
        match name {
            "profile" => {
                self.profile = rows.first().map(ProfileModel::from_row).transpose()?;
            }
            "orders" | "active_orders" => {
                self.orders = populate_models(&rows)?;
            }
            _ => return Err(unknown_relation::<Customer>(name)),
        }
        Ok(())
    }
}

pub fn customer_row(id: i32, name: &str, profile_id: Option<i32>) -> Row {
    Row::from_pairs([
        ("id", Value::Int(Some(id))),
        ("name", Value::String(Some(name.to_string()))),
        ("profile_id", Value::Int(profile_id)),
    ])
}

// ============================================================================
// Profile
// ============================================================================

#[derive(Debug, Default, Clone, Copy)]
pub struct Profile;

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileModel {
    pub id: i32,
    pub description: String,
}

impl LifeEntityName for Profile {
    fn table_name(&self) -> &'static str {
        "profile"
    }
}

impl LifeModelTrait for Profile {
    type Model = ProfileModel;
}

impl FromRow for ProfileModel {
    fn from_row(row: &Row) -> Result<Self, LifeError> {
        Ok(Self {
            id: row.try_get("id")?,
            description: row.try_get("description")?,
        })
    }
}

impl ModelTrait for ProfileModel {}

pub fn profile_row(id: i32, description: &str) -> Row {
    Row::from_pairs([
        ("id", Value::Int(Some(id))),
        ("description", Value::String(Some(description.to_string()))),
    ])
}

// ============================================================================
// Order
// ============================================================================

#[derive(Debug, Default, Clone, Copy)]
pub struct Order;

#[derive(Debug, Clone, PartialEq)]
pub struct OrderModel {
    pub id: i32,
    pub customer_id: i32,
    pub items: Vec<ItemModel>,
}

impl LifeEntityName for Order {
    fn table_name(&self) -> &'static str {
        "order"
    }
}

impl LifeModelTrait for Order {
    type Model = OrderModel;

    fn relation(&self, name: &str) -> Result<RelationDef, LifeError> {
        match name {
            "customer" => Ok(ActiveQuery::<Customer>::has_one([("id", "customer_id")]).into_relation(name)),
            "items" => Ok(ActiveQuery::<Item>::has_many([("id", "item_id")])
                .via_table("order_item", [("order_id", "id")])?
                .into_relation(name)),
            _ => Err(unknown_relation::<Self>(name)),
        }
    }
}

impl FromRow for OrderModel {
    fn from_row(row: &Row) -> Result<Self, LifeError> {
        Ok(Self {
            id: row.try_get("id")?,
            customer_id: row.try_get("customer_id")?,
            items: Vec::new(),
        })
    }
}

impl ModelTrait for OrderModel {
    fn populate_relation(&mut self, name: &str, rows: Vec<Row>) -> Result<(), LifeError> {
        match name {
            "items" => {
                self.items = rows.iter().map(ItemModel::from_row).collect::<Result<_, _>>()?;
                Ok(())
            }
            _ => Err(unknown_relation::<Order>(name)),
        }
    }
}

pub fn order_row(id: i32, customer_id: i32) -> Row {
    Row::from_pairs([
        ("id", Value::Int(Some(id))),
        ("customer_id", Value::Int(Some(customer_id))),
    ])
}

pub fn order_item_row(order_id: i32, item_id: i32) -> Row {
    Row::from_pairs([
        ("order_id", Value::Int(Some(order_id))),
        ("item_id", Value::Int(Some(item_id))),
    ])
}

// ============================================================================
// Item
// ============================================================================

#[derive(Debug, Default, Clone, Copy)]
pub struct Item;

#[derive(Debug, Clone, PartialEq)]
pub struct ItemModel {
    pub id: i32,
    pub name: String,
}

impl LifeEntityName for Item {
    fn table_name(&self) -> &'static str {
        "item"
    }
}

impl LifeModelTrait for Item {
    type Model = ItemModel;
}

impl FromRow for ItemModel {
    fn from_row(row: &Row) -> Result<Self, LifeError> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
        })
    }
}

impl ModelTrait for ItemModel {}

pub fn item_row(id: i32, name: &str) -> Row {
    Row::from_pairs([
        ("id", Value::Int(Some(id))),
        ("name", Value::String(Some(name.to_string()))),
    ])
}

// ============================================================================
// ScopedCustomer: default filter from the init hook
// ============================================================================

#[derive(Debug, Default, Clone, Copy)]
pub struct ScopedCustomer;

impl LifeEntityName for ScopedCustomer {
    fn table_name(&self) -> &'static str {
        "customer"
    }
}

impl LifeModelTrait for ScopedCustomer {
    type Model = CustomerModel;

    fn on_query_init(query: &mut ActiveQuery<Self>) {
        query.query.filter = Some(Filter::raw("1==1"));
    }
}
