//! Navigation state machine.
//!
//! Two disjoint screen graphs gated by the session phase: the public
//! graph (Login ⇄ Signup) and the protected graph (tabbed List/Map home
//! plus a note editor reached with a fully-populated draft payload). No
//! route in one graph is reachable from the other except through an auth
//! phase change, and nothing is mounted until the first phase
//! notification arrives.

use crate::models::{Note, NoteDraft};
use crate::session::AuthPhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicScreen {
    Login,
    Signup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HomeTab {
    #[default]
    List,
    Map,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProtectedScreen {
    Home(HomeTab),
    /// The editor owns its draft; it never re-fetches by id.
    Editor(NoteDraft),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// Pre-first-notification: render nothing.
    Splash,
    Public(PublicScreen),
    Protected(ProtectedScreen),
}

/// Routing state. In-graph operations invoked from the wrong graph are
/// no-ops; only [`Router::apply_phase`] crosses between graphs.
#[derive(Debug)]
pub struct Router {
    route: Route,
    last_tab: HomeTab,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self {
            route: Route::Splash,
            last_tab: HomeTab::List,
        }
    }

    #[must_use]
    pub const fn route(&self) -> &Route {
        &self.route
    }

    /// React to a session phase notification. Re-delivery of the current
    /// graph's phase keeps the in-graph position.
    pub fn apply_phase(&mut self, phase: &AuthPhase) {
        match phase {
            AuthPhase::Initializing => {
                self.route = Route::Splash;
            }
            AuthPhase::Unauthenticated => {
                if !matches!(self.route, Route::Public(_)) {
                    self.route = Route::Public(PublicScreen::Login);
                }
            }
            AuthPhase::Authenticated(_) => {
                if !matches!(self.route, Route::Protected(_)) {
                    self.last_tab = HomeTab::List;
                    self.route = Route::Protected(ProtectedScreen::Home(HomeTab::List));
                }
            }
        }
    }

    pub fn show_signup(&mut self) {
        if matches!(self.route, Route::Public(PublicScreen::Login)) {
            self.route = Route::Public(PublicScreen::Signup);
        }
    }

    pub fn show_login(&mut self) {
        if matches!(self.route, Route::Public(PublicScreen::Signup)) {
            self.route = Route::Public(PublicScreen::Login);
        }
    }

    pub fn select_tab(&mut self, tab: HomeTab) {
        if matches!(self.route, Route::Protected(ProtectedScreen::Home(_))) {
            self.last_tab = tab;
            self.route = Route::Protected(ProtectedScreen::Home(tab));
        }
    }

    /// Open the editor for an existing note. The whole record travels as
    /// the navigation payload.
    pub fn open_editor(&mut self, note: &Note) {
        self.open_draft(NoteDraft::from_note(note));
    }

    /// Open the editor on the default blank draft ("create new").
    pub fn new_note(&mut self) {
        self.open_draft(NoteDraft::blank());
    }

    fn open_draft(&mut self, draft: NoteDraft) {
        if matches!(self.route, Route::Protected(_)) {
            self.route = Route::Protected(ProtectedScreen::Editor(draft));
        }
    }

    /// Back to the tabbed view on the previously selected tab. Save,
    /// delete and cancel all route through here.
    pub fn close_editor(&mut self) {
        if matches!(self.route, Route::Protected(ProtectedScreen::Editor(_))) {
            self.route = Route::Protected(ProtectedScreen::Home(self.last_tab));
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
