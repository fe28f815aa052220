use chrono::{Duration, Utc};
use pulse_core::{OrgId, OrgScope, PortalError};
use pulse_store::entities::{MembershipStatus, PurchaseStatus};
use pulse_store::repo::pages::{NewPage, PageFilter, PageUpdate};
use pulse_store::repo::plans::NewPlan;
use pulse_store::repo::sections::NewSection;
use pulse_store::repo::{memberships, org_users, orgs, pages, plans, purchases, sections, users};
use pulse_store::Db;

async fn portal_db() -> Db {
    pulse_store::memory().await.unwrap()
}

fn page(slug: &str) -> NewPage {
    NewPage {
        slug: slug.to_string(),
        title: slug.to_string(),
        show_in_nav: true,
        nav_order: 0,
        published: true,
    }
}

async fn two_orgs(db: &Db) -> (OrgScope, OrgScope) {
    let a = orgs::create(db, "Iron Temple", "iron-temple").await.unwrap();
    let b = orgs::create(db, "Flex Gym", "flex-gym").await.unwrap();
    (
        OrgScope::tenant(OrgId(a.id)),
        OrgScope::tenant(OrgId(b.id)),
    )
}

#[tokio::test]
async fn created_rows_carry_the_scope_org() {
    let db = portal_db().await;
    let (scope_a, _) = two_orgs(&db).await;

    let created = pages::create(&db, &scope_a, page("home")).await.unwrap();
    assert_eq!(Some(OrgId(created.org_id)), scope_a.org());
}

#[tokio::test]
async fn listing_is_restricted_to_the_scope_org() {
    let db = portal_db().await;
    let (scope_a, scope_b) = two_orgs(&db).await;

    pages::create(&db, &scope_a, page("home")).await.unwrap();
    pages::create(&db, &scope_a, page("about")).await.unwrap();
    pages::create(&db, &scope_b, page("home")).await.unwrap();

    let listed = pages::list(&db, &scope_a, PageFilter::default()).await.unwrap();
    assert_eq!(listed.len(), 2);
    let org_a = scope_a.org().unwrap();
    assert!(listed.iter().all(|p| p.org_id == org_a.0));
}

#[tokio::test]
async fn cross_tenant_scope_sees_every_org() {
    let db = portal_db().await;
    let (scope_a, scope_b) = two_orgs(&db).await;

    pages::create(&db, &scope_a, page("home")).await.unwrap();
    pages::create(&db, &scope_b, page("home")).await.unwrap();

    let all = OrgScope::all_orgs("support review");
    let listed = pages::list(&db, &all, PageFilter::default()).await.unwrap();
    assert_eq!(listed.len(), 2);
}

#[tokio::test]
async fn cross_tenant_scope_cannot_create() {
    let db = portal_db().await;
    two_orgs(&db).await;

    let all = OrgScope::all_orgs("support review");
    let err = pages::create(&db, &all, page("home")).await.unwrap_err();
    let portal = PortalError::from_anyhow(&err).expect("structured error");
    assert_eq!(portal.code(), 403);
}

#[tokio::test]
async fn updates_never_touch_the_org_tag() {
    let db = portal_db().await;
    let (scope_a, _) = two_orgs(&db).await;

    let created = pages::create(&db, &scope_a, page("home")).await.unwrap();
    let updated = pages::update(
        &db,
        &scope_a,
        created.id,
        PageUpdate {
            title: Some("Welcome".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(updated.org_id, created.org_id);
    assert_eq!(updated.title, "Welcome");
}

#[tokio::test]
async fn foreign_tenant_cannot_read_or_update() {
    let db = portal_db().await;
    let (scope_a, scope_b) = two_orgs(&db).await;

    let created = pages::create(&db, &scope_a, page("home")).await.unwrap();

    assert!(pages::get(&db, &scope_b, created.id).await.unwrap().is_none());
    let touched = pages::update(
        &db,
        &scope_b,
        created.id,
        PageUpdate {
            title: Some("Hijacked".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(touched.is_none());
    assert!(!pages::soft_delete(&db, &scope_b, created.id).await.unwrap());
}

#[tokio::test]
async fn soft_delete_hides_rows_until_asked_for() {
    let db = portal_db().await;
    let (scope_a, _) = two_orgs(&db).await;

    let created = pages::create(&db, &scope_a, page("home")).await.unwrap();
    assert!(pages::soft_delete(&db, &scope_a, created.id).await.unwrap());

    let visible = pages::list(&db, &scope_a, PageFilter::default()).await.unwrap();
    assert!(visible.is_empty());

    let with_deleted = pages::list(
        &db,
        &scope_a,
        PageFilter {
            include_deleted: true,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(with_deleted.len(), 1);
    assert!(with_deleted[0].deleted_at.is_some());

    // Deleting twice is a no-op.
    assert!(!pages::soft_delete(&db, &scope_a, created.id).await.unwrap());
}

#[tokio::test]
async fn duplicate_slug_in_one_org_conflicts() {
    let db = portal_db().await;
    let (scope_a, scope_b) = two_orgs(&db).await;

    pages::create(&db, &scope_a, page("home")).await.unwrap();
    // Same slug in another org is fine.
    pages::create(&db, &scope_b, page("home")).await.unwrap();

    let err = pages::create(&db, &scope_a, page("home")).await.unwrap_err();
    let portal = PortalError::from_anyhow(&err).expect("structured error");
    assert_eq!(portal.code(), 409);
}

#[tokio::test]
async fn nav_pages_are_ordered_and_filtered() {
    let db = portal_db().await;
    let (scope_a, _) = two_orgs(&db).await;

    pages::create(
        &db,
        &scope_a,
        NewPage {
            nav_order: 2,
            ..page("contact")
        },
    )
    .await
    .unwrap();
    pages::create(
        &db,
        &scope_a,
        NewPage {
            nav_order: 1,
            ..page("home")
        },
    )
    .await
    .unwrap();
    pages::create(
        &db,
        &scope_a,
        NewPage {
            show_in_nav: false,
            ..page("hidden")
        },
    )
    .await
    .unwrap();
    pages::create(
        &db,
        &scope_a,
        NewPage {
            published: false,
            ..page("draft")
        },
    )
    .await
    .unwrap();

    let nav = pages::nav_pages(&db, &scope_a).await.unwrap();
    let slugs: Vec<&str> = nav.iter().map(|p| p.slug.as_str()).collect();
    assert_eq!(slugs, vec!["home", "contact"]);
}

#[tokio::test]
async fn sections_follow_their_page_scope() {
    let db = portal_db().await;
    let (scope_a, scope_b) = two_orgs(&db).await;

    let owned = pages::create(&db, &scope_a, page("home")).await.unwrap();

    let new = NewSection {
        kind: "hero".into(),
        heading: Some("Welcome".into()),
        body: "Train hard".into(),
        position: 0,
    };

    // Foreign scope cannot attach a section to someone else's page.
    let err = sections::create(&db, &scope_b, owned.id, new.clone())
        .await
        .unwrap_err();
    assert_eq!(PortalError::from_anyhow(&err).unwrap().code(), 404);

    let section = sections::create(&db, &scope_a, owned.id, new).await.unwrap();
    assert_eq!(section.org_id, owned.org_id);

    assert!(sections::list_for_page(&db, &scope_b, owned.id)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        sections::list_for_page(&db, &scope_a, owned.id)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn reordering_rewrites_positions_within_the_page() {
    let db = portal_db().await;
    let (scope_a, scope_b) = two_orgs(&db).await;

    let owned = pages::create(&db, &scope_a, page("home")).await.unwrap();
    let mut ids = Vec::new();
    for (i, kind) in ["hero", "text", "cta"].iter().enumerate() {
        let section = sections::create(
            &db,
            &scope_a,
            owned.id,
            NewSection {
                kind: kind.to_string(),
                heading: None,
                body: String::new(),
                position: i as i64,
            },
        )
        .await
        .unwrap();
        ids.push(section.id);
    }

    ids.reverse();
    let rows = sections::reorder(&db, &scope_a, owned.id, &ids).await.unwrap();
    let kinds: Vec<&str> = rows.iter().map(|s| s.kind.as_str()).collect();
    assert_eq!(kinds, vec!["cta", "text", "hero"]);

    // A foreign scope's reorder touches nothing it cannot see.
    let foreign = sections::reorder(&db, &scope_b, owned.id, &ids).await.unwrap();
    assert!(foreign.is_empty());
    let rows = sections::list_for_page(&db, &scope_a, owned.id).await.unwrap();
    assert_eq!(rows[0].kind, "cta");
}

#[tokio::test]
async fn overdue_memberships_expire_in_one_sweep() {
    let db = portal_db().await;
    let (scope_a, _) = two_orgs(&db).await;
    let org = scope_a.org().unwrap();

    let user = users::create(&db, "ada@example.com", None, false).await.unwrap();
    let plan = plans::create(
        &db,
        &scope_a,
        NewPlan {
            name: "Monthly".into(),
            description: None,
            price_cents: 4900,
            currency: "USD".into(),
            duration_days: 30,
        },
    )
    .await
    .unwrap();

    let now = Utc::now();
    memberships::create(&db, org, user.id, plan.id, now - Duration::days(60), now - Duration::days(30))
        .await
        .unwrap();
    let current = memberships::create(&db, org, user.id, plan.id, now, now + Duration::days(30))
        .await
        .unwrap();

    let expired = memberships::expire_overdue(&db, &scope_a).await.unwrap();
    assert_eq!(expired, 1);

    let rows = memberships::list(&db, &scope_a).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows
        .iter()
        .any(|m| m.id == current.id && m.status == MembershipStatus::Active));
    assert!(rows
        .iter()
        .any(|m| m.id != current.id && m.status == MembershipStatus::Expired));
}

#[tokio::test]
async fn purchase_transitions_are_guarded() {
    let db = portal_db().await;
    let (scope_a, _) = two_orgs(&db).await;

    let user = users::create(&db, "ada@example.com", None, false).await.unwrap();
    let plan = plans::create(
        &db,
        &scope_a,
        NewPlan {
            name: "Monthly".into(),
            description: None,
            price_cents: 4900,
            currency: "USD".into(),
            duration_days: 30,
        },
    )
    .await
    .unwrap();

    let purchase =
        purchases::create_pending(&db, &scope_a, user.id, plan.id, plan.price_cents, "USD")
            .await
            .unwrap();
    assert_eq!(purchase.status, PurchaseStatus::Pending);

    let paid = purchases::mark_paid(&db, &scope_a, purchase.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(paid.status, PurchaseStatus::Paid);

    // Replays and conflicting transitions are no-ops.
    assert!(purchases::mark_paid(&db, &scope_a, purchase.id)
        .await
        .unwrap()
        .is_none());
    assert!(purchases::mark_failed(&db, &scope_a, purchase.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn profile_lookup_names_the_principals_org() {
    let db = portal_db().await;
    let (scope_a, _) = two_orgs(&db).await;

    let user = users::create(&db, "ada@example.com", None, false).await.unwrap();
    assert!(org_users::org_for_user(&db, user.id).await.unwrap().is_none());

    org_users::ensure(&db, &scope_a, user.id, Some("Ada")).await.unwrap();
    assert_eq!(
        org_users::org_for_user(&db, user.id).await.unwrap(),
        scope_a.org()
    );

    // ensure() is idempotent: a second enrolment lands on the unique
    // (user_id, org_id) constraint and returns the existing profile
    // untouched rather than erroring.
    let again = org_users::ensure(&db, &scope_a, user.id, Some("A. Lovelace"))
        .await
        .unwrap();
    assert_eq!(again.display_name.as_deref(), Some("Ada"));
    assert_eq!(org_users::list(&db, &scope_a).await.unwrap().len(), 1);
}
