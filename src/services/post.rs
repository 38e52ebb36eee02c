use crate::{
    error::{AppError, AppResult},
    forms::{CleanedPost, ImageChange},
    models::{follow, post, Post, PostModel},
    response::{PageInfo, PaginatedResponse, POSTS_PER_PAGE},
    services::{
        group::{GroupRef, GroupService},
        media::MediaStorage,
        user::UserService,
    },
};
use sea_orm::{
    sea_query::Query, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Select,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Subdirectory of the media root that holds post images.
pub const POST_IMAGE_DIR: &str = "posts";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AuthorRef {
    pub id: i32,
    pub username: String,
}

/// A post as templates see it: author and group resolved, image as a URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PostView {
    pub id: i32,
    pub text: String,
    pub pub_date: chrono::NaiveDateTime,
    pub author: AuthorRef,
    pub group: Option<GroupRef>,
    pub image: Option<String>,
}

pub type PostPage = PaginatedResponse<PostView>;

pub struct PostService {
    db: DatabaseConnection,
}

impl PostService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_all(&self, page: u64, media: &MediaStorage) -> AppResult<PostPage> {
        self.paginate(Post::find(), page, media).await
    }

    pub async fn list_by_group(
        &self,
        group_id: i32,
        page: u64,
        media: &MediaStorage,
    ) -> AppResult<PostPage> {
        let query = Post::find().filter(post::Column::GroupId.eq(group_id));
        self.paginate(query, page, media).await
    }

    pub async fn list_by_author(
        &self,
        author_id: i32,
        page: u64,
        media: &MediaStorage,
    ) -> AppResult<PostPage> {
        let query = Post::find().filter(post::Column::AuthorId.eq(author_id));
        self.paginate(query, page, media).await
    }

    /// Posts by every author `user_id` follows.
    pub async fn list_followed(
        &self,
        user_id: i32,
        page: u64,
        media: &MediaStorage,
    ) -> AppResult<PostPage> {
        let followed = Query::select()
            .column(follow::Column::AuthorId)
            .from(follow::Entity)
            .and_where(follow::Column::UserId.eq(user_id))
            .to_owned();
        let query = Post::find().filter(post::Column::AuthorId.in_subquery(followed));
        self.paginate(query, page, media).await
    }

    async fn paginate(
        &self,
        query: Select<Post>,
        requested: u64,
        media: &MediaStorage,
    ) -> AppResult<PostPage> {
        let paginator = query
            .order_by_desc(post::Column::PubDate)
            .order_by_desc(post::Column::Id)
            .paginate(&self.db, POSTS_PER_PAGE);

        let count = paginator.num_items().await?;
        let info = PageInfo::new(requested, count, POSTS_PER_PAGE);
        let posts = paginator.fetch_page(info.index()).await?;

        let items = self.hydrate(posts, media).await?;
        Ok(PaginatedResponse::new(items, info))
    }

    /// Resolves `/<username>/<post_id>/`: the post must belong to that user.
    pub async fn get_by_author_and_id(&self, username: &str, id: i32) -> AppResult<PostModel> {
        let author = UserService::new(self.db.clone())
            .get_by_username(username)
            .await?;
        Post::find_by_id(id)
            .filter(post::Column::AuthorId.eq(author.id))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn count_by_author(&self, author_id: i32) -> AppResult<u64> {
        Ok(Post::find()
            .filter(post::Column::AuthorId.eq(author_id))
            .count(&self.db)
            .await?)
    }

    /// `author_id` is the authenticated user; the form never carries one.
    pub async fn create(
        &self,
        author_id: i32,
        cleaned: CleanedPost,
        media: &MediaStorage,
    ) -> AppResult<PostModel> {
        let image = store_image(&cleaned.image, None, media).await?;
        let now = chrono::Utc::now().naive_utc();

        let model = post::ActiveModel {
            text: sea_orm::ActiveValue::Set(cleaned.text),
            pub_date: sea_orm::ActiveValue::Set(now),
            author_id: sea_orm::ActiveValue::Set(author_id),
            group_id: sea_orm::ActiveValue::Set(cleaned.group_id),
            image: sea_orm::ActiveValue::Set(image),
            ..Default::default()
        };

        let post = model.insert(&self.db).await?;
        tracing::info!("Post {} created by user {}", post.id, author_id);
        Ok(post)
    }

    /// Author and publication date never change on edit.
    pub async fn update(
        &self,
        existing: PostModel,
        cleaned: CleanedPost,
        media: &MediaStorage,
    ) -> AppResult<PostModel> {
        let image = store_image(&cleaned.image, existing.image.clone(), media).await?;

        let mut model: post::ActiveModel = existing.into();
        model.text = sea_orm::ActiveValue::Set(cleaned.text);
        model.group_id = sea_orm::ActiveValue::Set(cleaned.group_id);
        model.image = sea_orm::ActiveValue::Set(image);

        let post = model.update(&self.db).await?;
        tracing::info!("Post {} edited", post.id);
        Ok(post)
    }

    pub async fn view(&self, post: PostModel, media: &MediaStorage) -> AppResult<PostView> {
        self.hydrate(vec![post], media)
            .await?
            .pop()
            .ok_or(AppError::NotFound)
    }

    /// Resolve authors and groups for a batch of posts with one query each,
    /// keeping the input order.
    pub async fn hydrate(
        &self,
        posts: Vec<PostModel>,
        media: &MediaStorage,
    ) -> AppResult<Vec<PostView>> {
        let author_ids: Vec<i32> = posts.iter().map(|p| p.author_id).collect();
        let group_ids: Vec<i32> = posts.iter().filter_map(|p| p.group_id).collect();

        let usernames = UserService::new(self.db.clone())
            .usernames(author_ids)
            .await?;
        let groups = GroupService::new(self.db.clone()).refs(group_ids).await?;

        Ok(posts
            .into_iter()
            .map(|p| PostView {
                id: p.id,
                author: AuthorRef {
                    id: p.author_id,
                    username: usernames.get(&p.author_id).cloned().unwrap_or_default(),
                },
                group: p.group_id.and_then(|g| groups.get(&g).cloned()),
                image: p.image.as_deref().map(|path| media.url(path)),
                text: p.text,
                pub_date: p.pub_date,
            })
            .collect())
    }
}

async fn store_image(
    change: &ImageChange,
    current: Option<String>,
    media: &MediaStorage,
) -> AppResult<Option<String>> {
    match change {
        ImageChange::Keep => Ok(current),
        ImageChange::Clear => Ok(None),
        ImageChange::Replace { data, ext } => {
            let path = media.save(POST_IMAGE_DIR, data, ext).await?;
            Ok(Some(path))
        }
    }
}
