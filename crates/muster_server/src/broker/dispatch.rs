//! Event dispatch: world-state mutation plus the broadcast set.
//!
//! Pure with respect to the broker - the caller owns the sockets; this layer
//! only talks to the store and says who should hear what. Store errors are
//! deliberately not caught here: they ride up to the worker's supervisor.

use tracing::warn;

use muster_protocol::{DomainEvent, DomainNotification, Identity};

use crate::world::{StoreError, WorldStore};

/// A notification paired with the identity it must be delivered to.
pub type Outbound = (Identity, DomainNotification);

/// Applies one event from `sender` to the store and computes the fan-out.
///
/// - `Join` acknowledges the sender with `Authenticated`, then announces
///   `Joined` to every other entity.
/// - `Move` applies the position change (store policy may make it a no-op)
///   and announces `Moved` to every other entity.
/// - `Leave` snapshots the peer set *before* removal, so the just-departed
///   client's peers all hear `Left`.
pub async fn dispatch(
    store: &dyn WorldStore,
    sender: Identity,
    event: DomainEvent,
) -> Result<Vec<Outbound>, StoreError> {
    let id = sender.to_string();
    let mut outbound = Vec::new();

    match event {
        DomainEvent::Join { name } => {
            store.join(&name, &id).await?;
            outbound.push((sender, DomainNotification::Authenticated));
            fan_out(
                store,
                &id,
                DomainNotification::Joined { id: sender },
                &mut outbound,
            )
            .await?;
        }
        DomainEvent::Move { x } => {
            store.try_move(&id, x).await?;
            fan_out(
                store,
                &id,
                DomainNotification::Moved { id: sender, x },
                &mut outbound,
            )
            .await?;
        }
        DomainEvent::Leave => {
            // Peer set is taken before removal.
            fan_out(
                store,
                &id,
                DomainNotification::Left { id: sender },
                &mut outbound,
            )
            .await?;
            store.leave(&id).await?;
        }
    }

    Ok(outbound)
}

async fn fan_out(
    store: &dyn WorldStore,
    except: &str,
    notification: DomainNotification,
    outbound: &mut Vec<Outbound>,
) -> Result<(), StoreError> {
    for peer in store.find_except(except).await? {
        match peer.id.parse::<Identity>() {
            Ok(destination) => outbound.push((destination, notification.clone())),
            Err(err) => warn!(entity = %peer.id, "skipping peer with unroutable id: {err}"),
        }
    }
    Ok(())
}
