//! Auth gate: what a page shows for the current sign-in state.
//!
//! Evaluated on every page render, so the view always reflects the session
//! the request arrived with.

use crate::middleware::LOGIN_PATH;
use crate::models::CurrentUser;

/// Pages that render the site chrome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    Login,
    Checkout,
}

impl Page {
    /// Path of the page, used to reload it after signing out.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Login => LOGIN_PATH,
            Self::Checkout => "/checkout",
        }
    }

    /// Login and checkout always show their own content.
    const fn always_shows_content(self) -> bool {
        matches!(self, Self::Login | Self::Checkout)
    }
}

/// The navigation link that toggles sign-in state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthLink {
    /// "Login / Sign Up", linking to the login page.
    Login,
    /// "Logout", signing the user out.
    Logout,
}

impl AuthLink {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::Logout => "Logout",
        }
    }

    /// Whether following the link signs the user out.
    #[must_use]
    pub const fn signs_out(self) -> bool {
        matches!(self, Self::Logout)
    }
}

/// Visibility decisions for one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateView {
    /// Main content wrapper, navigation menu and mobile menu toggle.
    pub show_content: bool,
    /// Cart counter badge (subscribed to the user's cart).
    pub show_cart_count: bool,
    pub auth_link: AuthLink,
    /// Send the browser elsewhere instead of rendering.
    pub redirect: Option<&'static str>,
    /// Email of the signed-in user.
    pub user_email: Option<String>,
}

/// Derive the gate view for `page`.
#[must_use]
pub fn evaluate(page: Page, user: Option<&CurrentUser>) -> GateView {
    match user {
        Some(user) => GateView {
            show_content: true,
            show_cart_count: true,
            auth_link: AuthLink::Logout,
            redirect: (page == Page::Login).then_some("/"),
            user_email: Some(user.email.to_string()),
        },
        None => GateView {
            show_content: page.always_shows_content(),
            show_cart_count: false,
            auth_link: AuthLink::Login,
            redirect: (page == Page::Checkout).then_some(LOGIN_PATH),
            user_email: None,
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use moon_bling_core::{Email, UserId};

    use super::*;

    fn user() -> CurrentUser {
        CurrentUser {
            id: UserId::parse("uid-1").unwrap(),
            email: Email::parse("asha@example.com").unwrap(),
        }
    }

    #[test]
    fn test_signed_in_home() {
        let user = user();
        let view = evaluate(Page::Home, Some(&user));
        assert!(view.show_content);
        assert!(view.show_cart_count);
        assert_eq!(view.auth_link, AuthLink::Logout);
        assert_eq!(view.redirect, None);
    }

    #[test]
    fn test_signed_in_login_page_redirects_home() {
        let user = user();
        assert_eq!(evaluate(Page::Login, Some(&user)).redirect, Some("/"));
        assert_eq!(evaluate(Page::Checkout, Some(&user)).redirect, None);
    }

    #[test]
    fn test_signed_out_home_hides_content() {
        let view = evaluate(Page::Home, None);
        assert!(!view.show_content);
        assert!(!view.show_cart_count);
        assert_eq!(view.auth_link, AuthLink::Login);
        assert_eq!(view.auth_link.label(), "Login");
        assert_eq!(view.redirect, None);
    }

    #[test]
    fn test_signed_out_checkout_redirects_to_login() {
        let view = evaluate(Page::Checkout, None);
        assert_eq!(view.redirect, Some(LOGIN_PATH));
        assert!(evaluate(Page::Login, None).show_content);
    }
}
