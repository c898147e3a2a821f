use axum::{extract::State, response::IntoResponse};
use serde::Serialize;
use serde_json::json;

use crate::app::AppState;
use crate::database::models::{
    BlogPost, CareerApplication, ClientProject, ContactSubmission, PortfolioItem, Service, ServiceItem, TeamMember,
    Testimonial,
};
use crate::database::{Entity, Repository, Store};
use crate::error::ApiResult;
use crate::middleware::{ApiResponse, Authenticated};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCounts {
    pub services: i64,
    pub service_items: i64,
    pub blog_posts: i64,
    pub portfolio_items: i64,
    pub testimonials: i64,
    pub team_members: i64,
    pub new_contact_submissions: i64,
    pub new_career_applications: i64,
    pub client_projects: i64,
}

async fn count_all<T: Entity>(store: &Store) -> ApiResult<i64> {
    let repo = Repository::<T>::new(store);
    Ok(repo.count(repo.filter()?).await?)
}

async fn count_new<T: Entity>(store: &Store) -> ApiResult<i64> {
    let repo = Repository::<T>::new(store);
    let mut filter = repo.filter()?;
    filter.where_eq("status", json!("new"))?;
    Ok(repo.count(filter).await?)
}

/// GET /dashboard - reached only through the edge gate
pub async fn dashboard(Authenticated(identity): Authenticated, State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let store = &state.store;
    let (services, service_items, blog_posts, portfolio_items, testimonials, team_members) = futures::try_join!(
        count_all::<Service>(store),
        count_all::<ServiceItem>(store),
        count_all::<BlogPost>(store),
        count_all::<PortfolioItem>(store),
        count_all::<Testimonial>(store),
        count_all::<TeamMember>(store),
    )?;
    let (new_contact_submissions, new_career_applications, client_projects) = futures::try_join!(
        count_new::<ContactSubmission>(store),
        count_new::<CareerApplication>(store),
        count_all::<ClientProject>(store),
    )?;
    let counts = DashboardCounts {
        services,
        service_items,
        blog_posts,
        portfolio_items,
        testimonials,
        team_members,
        new_contact_submissions,
        new_career_applications,
        client_projects,
    };

    Ok(ApiResponse::success(json!({
        "user": identity.user,
        "counts": counts,
    })))
}
