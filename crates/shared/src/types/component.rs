//! Cost components tracked per unit of inventory.
//!
//! Every monetary quantity held against a SKU is broken down along this fixed
//! axis. `ComponentCosts` always carries all four components, so a partial
//! record cannot be represented.

use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use super::money::Cents;

/// One axis of landed cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostComponent {
    /// Product cost paid to the manufacturer.
    Manufacturing,
    /// Inbound shipping.
    Freight,
    /// Import duty.
    Duty,
    /// Packaging and accessories bought alongside the product.
    Accessory,
}

impl CostComponent {
    /// All components, in canonical order.
    pub const ALL: [Self; 4] = [Self::Manufacturing, Self::Freight, Self::Duty, Self::Accessory];

    /// Label used when naming brand sub-accounts (`"{label} - {brand}"`).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Manufacturing => "Manufacturing",
            Self::Freight => "Freight",
            Self::Duty => "Duty",
            Self::Accessory => "Mfg Accessories",
        }
    }
}

impl std::fmt::Display for CostComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A value in cents for every cost component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentCosts {
    /// Manufacturing value.
    #[serde(default)]
    pub manufacturing: Cents,
    /// Freight value.
    #[serde(default)]
    pub freight: Cents,
    /// Duty value.
    #[serde(default)]
    pub duty: Cents,
    /// Accessory value.
    #[serde(default)]
    pub accessory: Cents,
}

impl ComponentCosts {
    /// All components zero.
    pub const ZERO: Self = Self {
        manufacturing: 0,
        freight: 0,
        duty: 0,
        accessory: 0,
    };

    /// Creates costs with a single nonzero component.
    #[must_use]
    pub fn single(component: CostComponent, cents: Cents) -> Self {
        let mut costs = Self::ZERO;
        *costs.get_mut(component) = cents;
        costs
    }

    /// Returns the value held for a component.
    #[must_use]
    pub const fn get(&self, component: CostComponent) -> Cents {
        match component {
            CostComponent::Manufacturing => self.manufacturing,
            CostComponent::Freight => self.freight,
            CostComponent::Duty => self.duty,
            CostComponent::Accessory => self.accessory,
        }
    }

    /// Returns a mutable reference to a component's value.
    pub fn get_mut(&mut self, component: CostComponent) -> &mut Cents {
        match component {
            CostComponent::Manufacturing => &mut self.manufacturing,
            CostComponent::Freight => &mut self.freight,
            CostComponent::Duty => &mut self.duty,
            CostComponent::Accessory => &mut self.accessory,
        }
    }

    /// Iterates `(component, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (CostComponent, Cents)> + '_ {
        CostComponent::ALL.into_iter().map(|c| (c, self.get(c)))
    }

    /// Builds costs by evaluating `f` for each component.
    pub fn from_fn(mut f: impl FnMut(CostComponent) -> Cents) -> Self {
        Self {
            manufacturing: f(CostComponent::Manufacturing),
            freight: f(CostComponent::Freight),
            duty: f(CostComponent::Duty),
            accessory: f(CostComponent::Accessory),
        }
    }

    /// Sum across all components.
    #[must_use]
    pub const fn total(&self) -> Cents {
        self.manufacturing + self.freight + self.duty + self.accessory
    }

    /// Returns true if every component is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.manufacturing == 0 && self.freight == 0 && self.duty == 0 && self.accessory == 0
    }
}

impl Add for ComponentCosts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_fn(|c| self.get(c) + rhs.get(c))
    }
}

impl AddAssign for ComponentCosts {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for ComponentCosts {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::from_fn(|c| self.get(c) - rhs.get(c))
    }
}

impl SubAssign for ComponentCosts {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for ComponentCosts {
    type Output = Self;

    fn neg(self) -> Self {
        Self::from_fn(|c| -self.get(c))
    }
}
