//! Filter enums shared by list commands

use clap::ValueEnum;

use crate::entities::inventory::StockStatus;
use crate::entities::machine::PartStatus;

/// Stock level filter for inventory lists
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum StockFilter {
    /// Above the minimum quantity
    InStock,
    /// At or below the minimum, but not empty
    Low,
    /// Nothing left
    Out,
    /// Low or out of stock
    Reorder,
    #[default]
    All,
}

impl StockFilter {
    pub fn matches(&self, status: StockStatus) -> bool {
        match self {
            StockFilter::InStock => status == StockStatus::InStock,
            StockFilter::Low => status == StockStatus::LowStock,
            StockFilter::Out => status == StockStatus::OutOfStock,
            StockFilter::Reorder => status != StockStatus::InStock,
            StockFilter::All => true,
        }
    }
}

/// Wear status filter for part and usage lists
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum PartStatusFilter {
    Normal,
    Warning,
    Critical,
    /// Warning or critical
    Attention,
    #[default]
    All,
}

impl PartStatusFilter {
    pub fn matches(&self, status: PartStatus) -> bool {
        match self {
            PartStatusFilter::Normal => status == PartStatus::Normal,
            PartStatusFilter::Warning => status == PartStatus::Warning,
            PartStatusFilter::Critical => status == PartStatus::Critical,
            PartStatusFilter::Attention => status != PartStatus::Normal,
            PartStatusFilter::All => true,
        }
    }
}
