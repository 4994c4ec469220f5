pub mod user;
pub mod portfolio;
pub mod membership;
pub mod invitation;
pub mod subscription;
pub mod post;
pub mod post_publication;
pub mod organization_grant;

pub use user::Entity as User;
pub use portfolio::Entity as Portfolio;
pub use membership::Entity as Membership;
pub use invitation::Entity as Invitation;
pub use subscription::Entity as Subscription;
pub use post::Entity as Post;
pub use post_publication::Entity as PostPublication;
pub use organization_grant::Entity as OrganizationGrant;
