pub mod comment;
pub mod flatpage;
pub mod follow;
pub mod group;
pub mod post;
pub mod user;

pub use comment::{Entity as Comment, Model as CommentModel};
pub use flatpage::{Entity as FlatPage, Model as FlatPageModel};
pub use follow::{Entity as Follow, Model as FollowModel};
pub use group::{Entity as Group, Model as GroupModel};
pub use post::{Entity as Post, Model as PostModel};
pub use user::{Entity as User, Model as UserModel};
