//! Aura-projecting entities as one tagged variant.

use auras_types::Disposition;
use serde::{Deserialize, Serialize};

use super::{Drawing, Template, Token};
use crate::host::SpatialOracle;
use crate::ids::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Token,
    Template,
    Drawing,
}

/// Resolved geometry parameters for one containment query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reach {
    pub walls_block: bool,
    pub height: bool,
    pub radius: f64,
}

/// A live entity projecting an aura
#[derive(Debug, Clone, Copy)]
pub enum AuraSource<'a> {
    Token(&'a Token),
    Template(&'a Template),
    Drawing(&'a Drawing),
}

impl<'a> AuraSource<'a> {
    pub fn id(&self) -> &'a EntityId {
        match self {
            Self::Token(t) => &t.id,
            Self::Template(t) => &t.id,
            Self::Drawing(d) => &d.id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Token(_) => EntityKind::Token,
            Self::Template(_) => EntityKind::Template,
            Self::Drawing(_) => EntityKind::Drawing,
        }
    }

    /// Disposition compared against targets; templates use their caster's
    pub fn disposition(&self, caster: Option<Disposition>) -> Option<Disposition> {
        match self {
            Self::Token(t) => Some(t.disposition),
            Self::Template(_) => caster,
            Self::Drawing(_) => None,
        }
    }

    /// Shape projected at `radius`. Templates carry their own shape.
    pub fn projected_shape<O: SpatialOracle + ?Sized>(
        &self,
        oracle: &O,
        radius: f64,
    ) -> Option<O::Shape> {
        match self {
            Self::Template(_) => None,
            _ => Some(oracle.shape_of(*self, radius)),
        }
    }

    /// Distance to `target` when it lies inside the aura
    pub fn containment_test<O: SpatialOracle + ?Sized>(
        &self,
        oracle: &O,
        target: &Token,
        reach: Reach,
    ) -> Option<f64> {
        match self {
            Self::Template(template) => {
                oracle.contains_template(template, target, reach.walls_block)
            }
            _ => {
                let shape = self.projected_shape(oracle, reach.radius)?;
                oracle.contains(target, *self, reach, &shape)
            }
        }
    }
}
