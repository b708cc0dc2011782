//! Per-faction registry of planning objects
//!
//! Planning objects refer to each other only through [`ObjectId`] handles
//! resolved here. A handle can be declared before the object behind it is
//! known ("forward declared"); such a slot has an identity and nothing else.
//!
//! Removing an object never reaches into other objects directly. `dispose`
//! returns [`Disposal`] events describing the follow-up work, and `apply`
//! carries them out, cascading through further disposals as needed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::ai::mission::MissionTask;
use crate::ai::tile_improvement::TileImprovementPlan;
use crate::ai::wish::{Fulfiller, Wish};
use crate::core::error::{AiError, Result};
use crate::core::types::{
    Destination, GoodsId, GoodsTypeId, PlanId, SettlementId, UnitId, WishId,
};

/// Stable handle of a registry object
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ObjectId {
    Unit(UnitId),
    Colony(SettlementId),
    Wish(WishId),
    TileImprovement(PlanId),
    Goods(GoodsId),
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectId::Unit(id) => write!(f, "{}", id),
            ObjectId::Colony(id) => write!(f, "{}", id),
            ObjectId::Wish(id) => write!(f, "{}", id),
            ObjectId::TileImprovement(id) => write!(f, "{}", id),
            ObjectId::Goods(id) => write!(f, "{}", id),
        }
    }
}

impl FromStr for ObjectId {
    type Err = AiError;

    fn from_str(s: &str) -> Result<Self> {
        let (prefix, number) = s
            .split_once(':')
            .ok_or_else(|| AiError::UnknownType(s.to_string()))?;
        let n: u32 = number
            .parse()
            .map_err(|_| AiError::UnknownType(s.to_string()))?;
        match prefix {
            "unit" => Ok(ObjectId::Unit(UnitId(n))),
            "colony" => Ok(ObjectId::Colony(SettlementId(n))),
            "wish" => Ok(ObjectId::Wish(WishId(n))),
            "tileimprovementplan" => Ok(ObjectId::TileImprovement(PlanId(n))),
            "goods" => Ok(ObjectId::Goods(GoodsId(n))),
            _ => Err(AiError::UnknownType(s.to_string())),
        }
    }
}

/// Planning state of one of the faction's units
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiUnit {
    pub id: UnitId,
    pub mission: Option<MissionTask>,
}

impl AiUnit {
    pub fn new(id: UnitId) -> Self {
        Self { id, mission: None }
    }

    pub fn dispose(&self) -> Vec<Disposal> {
        match &self.mission {
            Some(MissionTask::RealizeWish { wish, .. }) => vec![Disposal::ReleaseWish { wish: *wish }],
            Some(MissionTask::Pioneer {
                plan: Some(plan), ..
            }) => vec![Disposal::ReleasePlan { plan: *plan }],
            Some(MissionTask::Transport { goods, .. }) => goods
                .iter()
                .map(|g| Disposal::ClearCarrier { goods: *g, unit: self.id })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Planning state of one of the faction's settlements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiColony {
    pub id: SettlementId,
    /// Wish pool, highest value first
    pub wishes: Vec<WishId>,
    pub tile_improvements: Vec<PlanId>,
}

impl AiColony {
    pub fn new(id: SettlementId) -> Self {
        Self {
            id,
            wishes: Vec::new(),
            tile_improvements: Vec::new(),
        }
    }

    pub fn dispose(&self) -> Vec<Disposal> {
        self.wishes
            .iter()
            .map(|w| Disposal::Dispose(ObjectId::Wish(*w)))
            .chain(
                self.tile_improvements
                    .iter()
                    .map(|p| Disposal::Dispose(ObjectId::TileImprovement(*p))),
            )
            .collect()
    }
}

/// A parcel of goods on its way to a destination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiGoods {
    pub id: GoodsId,
    pub goods_type: GoodsTypeId,
    pub amount: i32,
    pub source: SettlementId,
    pub destination: Destination,
    /// Wish this parcel satisfies
    pub wish: Option<WishId>,
    pub carrier: Option<UnitId>,
}

impl AiGoods {
    pub fn dispose(&self) -> Vec<Disposal> {
        let mut events = Vec::with_capacity(2);
        if let Some(wish) = self.wish {
            events.push(Disposal::ReleaseWish { wish });
        }
        if let Some(unit) = self.carrier {
            events.push(Disposal::DropCargo { unit, goods: self.id });
        }
        events
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AiObject {
    Unit(AiUnit),
    Colony(AiColony),
    Wish(Wish),
    TileImprovement(TileImprovementPlan),
    Goods(AiGoods),
}

impl AiObject {
    pub fn id(&self) -> ObjectId {
        match self {
            AiObject::Unit(u) => ObjectId::Unit(u.id),
            AiObject::Colony(c) => ObjectId::Colony(c.id),
            AiObject::Wish(w) => ObjectId::Wish(w.id),
            AiObject::TileImprovement(p) => ObjectId::TileImprovement(p.id),
            AiObject::Goods(g) => ObjectId::Goods(g.id),
        }
    }

    fn dispose(&self) -> Vec<Disposal> {
        match self {
            AiObject::Unit(u) => u.dispose(),
            AiObject::Colony(c) => c.dispose(),
            AiObject::Wish(w) => w.dispose(),
            AiObject::TileImprovement(p) => p.dispose(),
            AiObject::Goods(g) => g.dispose(),
        }
    }
}

/// Follow-up work produced by disposing an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Disposal {
    /// A disposed wish had a fulfiller: drop the fulfiller's claim on it
    UnbindFulfiller { wish: WishId, fulfiller: Fulfiller },
    /// Remove a disposed wish from its settlement's pool
    DetachWish { colony: SettlementId, wish: WishId },
    /// A disposed plan had a pioneer: clear the pioneer's plan reference
    ClearPioneerPlan { unit: UnitId, plan: PlanId },
    DetachPlan { colony: SettlementId, plan: PlanId },
    /// A disposed fulfiller: return the wish to the pool
    ReleaseWish { wish: WishId },
    /// A disposed pioneer: the plan is open again
    ReleasePlan { plan: PlanId },
    /// A disposed carrier: the parcel waits for another
    ClearCarrier { goods: GoodsId, unit: UnitId },
    /// A disposed parcel: take it off its carrier's manifest
    DropCargo { unit: UnitId, goods: GoodsId },
    Dispose(ObjectId),
}

#[derive(Debug, Clone)]
enum Slot {
    /// Referenced, not yet populated
    Forward,
    Live(AiObject),
}

/// Arena of planning objects owned by one faction
#[derive(Debug, Clone, Default)]
pub struct Registry {
    objects: BTreeMap<ObjectId, Slot>,
    next_id: u32,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
            next_id: 1,
        }
    }

    fn allocate(&mut self) -> u32 {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        id
    }

    /// Reserve a handle without data; returns false if it is already known
    pub fn declare(&mut self, id: ObjectId) -> bool {
        if self.objects.contains_key(&id) {
            return false;
        }
        self.objects.insert(id, Slot::Forward);
        true
    }

    /// Store an object, replacing a forward declaration
    pub fn populate(&mut self, object: AiObject) -> ObjectId {
        let id = object.id();
        self.objects.insert(id, Slot::Live(object));
        id
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn is_forward_declared(&self, id: ObjectId) -> bool {
        matches!(self.objects.get(&id), Some(Slot::Forward))
    }

    pub fn get(&self, id: ObjectId) -> Result<&AiObject> {
        match self.objects.get(&id) {
            Some(Slot::Live(object)) => Ok(object),
            Some(Slot::Forward) => Err(AiError::ForwardDeclared(id)),
            None => Err(AiError::MissingReference(id)),
        }
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Result<&mut AiObject> {
        match self.objects.get_mut(&id) {
            Some(Slot::Live(object)) => Ok(object),
            Some(Slot::Forward) => Err(AiError::ForwardDeclared(id)),
            None => Err(AiError::MissingReference(id)),
        }
    }

    /// Unit handles in ascending order, forward-declared ones included
    pub fn unit_ids(&self) -> Vec<UnitId> {
        self.objects
            .keys()
            .filter_map(|id| match id {
                ObjectId::Unit(u) => Some(*u),
                _ => None,
            })
            .collect()
    }

    pub fn colony_ids(&self) -> Vec<SettlementId> {
        self.objects
            .keys()
            .filter_map(|id| match id {
                ObjectId::Colony(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    // === TYPED ACCESS ===

    pub fn unit(&self, id: UnitId) -> Result<&AiUnit> {
        match self.get(ObjectId::Unit(id))? {
            AiObject::Unit(u) => Ok(u),
            _ => Err(AiError::MissingReference(ObjectId::Unit(id))),
        }
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Result<&mut AiUnit> {
        match self.get_mut(ObjectId::Unit(id))? {
            AiObject::Unit(u) => Ok(u),
            _ => Err(AiError::MissingReference(ObjectId::Unit(id))),
        }
    }

    pub fn colony(&self, id: SettlementId) -> Result<&AiColony> {
        match self.get(ObjectId::Colony(id))? {
            AiObject::Colony(c) => Ok(c),
            _ => Err(AiError::MissingReference(ObjectId::Colony(id))),
        }
    }

    pub fn colony_mut(&mut self, id: SettlementId) -> Result<&mut AiColony> {
        match self.get_mut(ObjectId::Colony(id))? {
            AiObject::Colony(c) => Ok(c),
            _ => Err(AiError::MissingReference(ObjectId::Colony(id))),
        }
    }

    pub fn wish(&self, id: WishId) -> Result<&Wish> {
        match self.get(ObjectId::Wish(id))? {
            AiObject::Wish(w) => Ok(w),
            _ => Err(AiError::MissingReference(ObjectId::Wish(id))),
        }
    }

    pub fn wish_mut(&mut self, id: WishId) -> Result<&mut Wish> {
        match self.get_mut(ObjectId::Wish(id))? {
            AiObject::Wish(w) => Ok(w),
            _ => Err(AiError::MissingReference(ObjectId::Wish(id))),
        }
    }

    pub fn plan(&self, id: PlanId) -> Result<&TileImprovementPlan> {
        match self.get(ObjectId::TileImprovement(id))? {
            AiObject::TileImprovement(p) => Ok(p),
            _ => Err(AiError::MissingReference(ObjectId::TileImprovement(id))),
        }
    }

    pub fn plan_mut(&mut self, id: PlanId) -> Result<&mut TileImprovementPlan> {
        match self.get_mut(ObjectId::TileImprovement(id))? {
            AiObject::TileImprovement(p) => Ok(p),
            _ => Err(AiError::MissingReference(ObjectId::TileImprovement(id))),
        }
    }

    pub fn goods(&self, id: GoodsId) -> Result<&AiGoods> {
        match self.get(ObjectId::Goods(id))? {
            AiObject::Goods(g) => Ok(g),
            _ => Err(AiError::MissingReference(ObjectId::Goods(id))),
        }
    }

    pub fn goods_mut(&mut self, id: GoodsId) -> Result<&mut AiGoods> {
        match self.get_mut(ObjectId::Goods(id))? {
            AiObject::Goods(g) => Ok(g),
            _ => Err(AiError::MissingReference(ObjectId::Goods(id))),
        }
    }

    /// Every live goods parcel, in handle order
    pub fn parcels(&self) -> Vec<&AiGoods> {
        self.objects
            .values()
            .filter_map(|slot| match slot {
                Slot::Live(AiObject::Goods(g)) => Some(g),
                _ => None,
            })
            .collect()
    }

    // === CREATION ===

    /// Create a wish with a fresh handle and add it to its settlement's pool
    pub fn create_wish(&mut self, build: impl FnOnce(WishId) -> Wish) -> Result<WishId> {
        let id = WishId(self.allocate());
        let wish = build(id);
        let value = wish.value;
        let colony = wish.colony;
        self.colony(colony)?;
        self.populate(AiObject::Wish(wish));
        let pool = self.colony(colony)?.wishes.clone();
        let position = pool
            .iter()
            .position(|w| self.wish(*w).map_or(true, |w| w.value < value))
            .unwrap_or(pool.len());
        self.colony_mut(colony)?.wishes.insert(position, id);
        Ok(id)
    }

    pub fn create_plan(
        &mut self,
        build: impl FnOnce(PlanId) -> TileImprovementPlan,
    ) -> Result<PlanId> {
        let id = PlanId(self.allocate());
        let plan = build(id);
        let colony = plan.colony;
        self.colony(colony)?;
        self.populate(AiObject::TileImprovement(plan));
        self.colony_mut(colony)?.tile_improvements.push(id);
        Ok(id)
    }

    pub fn create_goods(&mut self, build: impl FnOnce(GoodsId) -> AiGoods) -> GoodsId {
        let id = GoodsId(self.allocate());
        self.populate(AiObject::Goods(build(id)));
        id
    }

    // === DISPOSAL ===

    /// Remove an object and return the follow-up events, unapplied
    pub fn dispose(&mut self, id: ObjectId) -> Vec<Disposal> {
        match self.objects.remove(&id) {
            Some(Slot::Live(object)) => object.dispose(),
            Some(Slot::Forward) => Vec::new(),
            None => {
                warn!("Dispose of unknown object {}", id);
                Vec::new()
            }
        }
    }

    /// Apply disposal events, cascading through any further disposals
    pub fn apply(&mut self, events: Vec<Disposal>) {
        let mut pending = events;
        while !pending.is_empty() {
            let mut next = Vec::new();
            for event in pending {
                debug!(?event, "Applying disposal");
                match event {
                    Disposal::UnbindFulfiller { wish, fulfiller } => {
                        self.unbind_fulfiller(wish, fulfiller)
                    }
                    Disposal::DetachWish { colony, wish } => match self.colony_mut(colony) {
                        Ok(c) => c.wishes.retain(|w| *w != wish),
                        Err(e) => warn!("Cannot detach {}: {}", wish, e),
                    },
                    Disposal::ClearPioneerPlan { unit, plan } => match self.unit_mut(unit) {
                        Ok(u) => {
                            if let Some(MissionTask::Pioneer { plan: current, .. }) = &mut u.mission {
                                if *current == Some(plan) {
                                    *current = None;
                                }
                            }
                        }
                        Err(e) => warn!("Cannot clear {} from pioneer: {}", plan, e),
                    },
                    Disposal::DetachPlan { colony, plan } => match self.colony_mut(colony) {
                        Ok(c) => c.tile_improvements.retain(|p| *p != plan),
                        Err(e) => warn!("Cannot detach {}: {}", plan, e),
                    },
                    Disposal::ReleaseWish { wish } => match self.wish_mut(wish) {
                        Ok(w) => {
                            w.release();
                        }
                        Err(e) => warn!("Cannot release wish: {}", e),
                    },
                    Disposal::ReleasePlan { plan } => match self.plan_mut(plan) {
                        Ok(p) => p.pioneer = None,
                        Err(e) => warn!("Cannot release plan: {}", e),
                    },
                    Disposal::ClearCarrier { goods, unit } => match self.goods_mut(goods) {
                        Ok(g) => {
                            if g.carrier == Some(unit) {
                                g.carrier = None;
                            }
                        }
                        Err(e) => warn!("Cannot unload {}: {}", goods, e),
                    },
                    Disposal::DropCargo { unit, goods } => match self.unit_mut(unit) {
                        Ok(u) => {
                            if let Some(MissionTask::Transport { goods: cargo, .. }) = &mut u.mission {
                                cargo.retain(|g| *g != goods);
                            }
                        }
                        Err(e) => warn!("Cannot drop {} from carrier: {}", goods, e),
                    },
                    Disposal::Dispose(id) => next.extend(self.dispose(id)),
                }
            }
            pending = next;
        }
    }

    /// Dispose an object and apply everything that follows from it
    pub fn remove(&mut self, id: ObjectId) {
        let events = self.dispose(id);
        self.apply(events);
    }

    fn unbind_fulfiller(&mut self, wish: WishId, fulfiller: Fulfiller) {
        match fulfiller {
            Fulfiller::Unit(unit) => match self.unit_mut(unit) {
                Ok(u) => {
                    if matches!(u.mission, Some(MissionTask::RealizeWish { wish: w, .. }) if w == wish) {
                        u.mission = None;
                    }
                }
                Err(e) => warn!("Fulfiller of {} unavailable: {}", wish, e),
            },
            Fulfiller::Goods(goods) => match self.goods_mut(goods) {
                Ok(g) => g.wish = None,
                Err(e) => warn!("Fulfiller of {} unavailable: {}", wish, e),
            },
        }
    }
}
