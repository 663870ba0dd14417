// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Workflow Gate contributors

use std::sync::Arc;

use crate::auth::gate::{default_route_table, RouteTable};
use crate::store::JsonConfigStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<JsonConfigStore>,
    pub routes: Arc<RouteTable>,
}

impl AppState {
    pub fn new(store: JsonConfigStore) -> Self {
        Self {
            store: Arc::new(store),
            routes: Arc::new(default_route_table()),
        }
    }

    pub fn with_routes(mut self, routes: RouteTable) -> Self {
        self.routes = Arc::new(routes);
        self
    }
}
