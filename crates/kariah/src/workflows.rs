mod http;
pub mod kariah;
pub mod khairat;
pub mod payments;
pub mod review;
