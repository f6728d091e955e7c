pub mod token;
pub mod user;

pub use token::{IdTokenClaims, OAuthTokenSet};
pub use user::{
    LandlordApplicationInput, PendingVerification, SignUpInput, UpdateUserInput, UserProfile,
    UserProfilePatch, UserType, VerificationStatus,
};
