use super::Side;
use super::node::Node;
use crate::error::Result;
use crate::statics::{KEY_PILOT_CONTROL_VEHICLES, KEY_ROLES};
use crate::validator::Validator;
use crate::value::{LuaValue, ValueKind};
use std::sync::LazyLock;

static SLOTS: LazyLock<Validator> = LazyLock::new(|| {
    Validator::new()
        .kind(ValueKind::Integer)
        .min(0.0)
        .max(100.0)
        .logged()
});

/// Combined-arms roles players can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    ArtilleryCommander,
    Instructor,
    Observer,
    ForwardObserver,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::ArtilleryCommander,
        Role::Instructor,
        Role::Observer,
        Role::ForwardObserver,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::ArtilleryCommander => "artillery_commander",
            Role::Instructor => "instructor",
            Role::Observer => "observer",
            Role::ForwardObserver => "forward_observer",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GroundControl {
    node: Node,
}

impl GroundControl {
    pub(crate) fn new(node: Node) -> Self {
        Self { node }
    }

    pub fn pilot_can_control_vehicles(&self) -> Result<bool> {
        self.node.get(&[KEY_PILOT_CONTROL_VEHICLES])
    }

    pub fn set_pilot_can_control_vehicles(&self, allowed: bool) -> Result<()> {
        self.node
            .set(&[KEY_PILOT_CONTROL_VEHICLES], LuaValue::from(allowed))
    }

    /// Number of player slots for `role` on `side`.
    pub fn slots(&self, role: Role, side: Side) -> Result<i64> {
        self.node.get(&[KEY_ROLES, role.as_str(), side.as_str()])
    }

    pub fn set_slots(&self, role: Role, side: Side, count: i64) -> Result<()> {
        let field = format!("{}_{}", role.as_str(), side.as_str());
        self.node.set_checked(
            &[KEY_ROLES, role.as_str(), side.as_str()],
            &field,
            LuaValue::from(count),
            &SLOTS,
        )
    }
}
