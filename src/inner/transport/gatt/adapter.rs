use btleplug::api::{Central, Manager as _};
use btleplug::platform::{Adapter, Manager};
use tracing::{info, warn};

use crate::inner::error::{LinkError, LinkResult};

/// First adapter whose description contains `filter`, or simply the first one.
///
/// A missing bluetooth stack is not fatal: start commands are ignored without an adapter.
pub(crate) async fn select_adapter(filter: Option<&str>) -> Option<Adapter> {
    let manager = match Manager::new().await {
        Ok(manager) => manager,
        Err(err) => {
            warn!(?err, "Bluetooth stack unavailable, start commands will be ignored");
            return None;
        }
    };
    let adapters = match manager.adapters().await {
        Ok(adapters) => adapters,
        Err(err) => {
            warn!(?err, "Failed to list adapters, start commands will be ignored");
            return None;
        }
    };

    let mut described = Vec::with_capacity(adapters.len());
    for adapter in adapters {
        let adapter_info = adapter.adapter_info().await;
        described.push((adapter, adapter_info.map_err(LinkError::from)));
    }

    let selected = first_matching(described, filter);
    if selected.is_none() {
        warn!(?filter, "No matching bluetooth adapter, start commands will be ignored");
    }
    selected
}

fn first_matching<A>(
    candidates: impl IntoIterator<Item = (A, LinkResult<String>)>,
    filter: Option<&str>,
) -> Option<A> {
    for (adapter, adapter_info) in candidates {
        let adapter_info = match adapter_info {
            Ok(adapter_info) => adapter_info,
            Err(err) => {
                warn!(?err, "Skipping adapter that could not be described");
                continue;
            }
        };
        info!(%adapter_info, "Discovered adapter");
        if filter.map_or(true, |filter| adapter_info.contains(filter)) {
            return Some(adapter);
        }
    }
    None
}
