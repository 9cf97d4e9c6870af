use crate::routes::Route;

pub const TITLE: &str = "Thank You for Voting!";
pub const MESSAGE: &str = "Your vote has been successfully recorded. We appreciate your participation in the school election.";

/// Terminal confirmation screen. Its only action leads back to login.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThankYouPage;

impl ThankYouPage {
    pub fn title(&self) -> &'static str {
        TITLE
    }

    pub fn message(&self) -> &'static str {
        MESSAGE
    }

    pub fn return_to_login(&self) -> Route {
        Route::Login
    }
}
