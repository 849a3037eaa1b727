use lotledger_core::Actor;

/// Actor context for a request.
///
/// Populated by the actor middleware from the identity the upstream
/// authentication collaborator resolved; must be present for all ledger
/// routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    actor: Actor,
}

impl ActorContext {
    pub fn new(actor: Actor) -> Self {
        Self { actor }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }
}
