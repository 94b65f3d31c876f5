#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Catalog search integration tests.
//!
//! Every test works in its own subject codes and names so results are not
//! affected by rows other tests insert into the shared database.

mod common;

use std::collections::HashSet;

use paydeya_kernel::catalog::{
    CatalogService, MaterialFilters, PageRequest, TeacherFilters,
};
use paydeya_test_utils::{insert_rating, test_material, test_user, unique_suffix};
use uuid::Uuid;

fn subject_filter(subject: &str) -> MaterialFilters {
    MaterialFilters {
        subject: Some(subject.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn subject_filter_counts_only_matching_materials() {
    let pool = common::test_pool().await;
    let suffix = unique_suffix();
    let math = format!("math-{suffix}");
    let physics = format!("physics-{suffix}");
    let chemistry = format!("chemistry-{suffix}");

    let teacher = test_user("Subject Teacher").teacher().insert(&pool).await.unwrap();
    for i in 0..3 {
        test_material(&format!("Algebra {i}"), &math, teacher.id)
            .insert(&pool)
            .await
            .unwrap();
    }
    for i in 0..2 {
        test_material(&format!("Optics {i}"), &physics, teacher.id)
            .insert(&pool)
            .await
            .unwrap();
    }

    let service = CatalogService::new(pool.clone());

    let page = service
        .search_materials(&subject_filter(&math), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 3);
    assert!(page.items.iter().all(|m| m.subject == math));
    assert!(!page.has_more());

    let page = service
        .search_materials(&subject_filter(&physics), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 2);

    let page = service
        .search_materials(&subject_filter(&chemistry), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 0);
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn drafts_are_never_listed() {
    let pool = common::test_pool().await;
    let subject = format!("draft-{}", unique_suffix());

    let teacher = test_user("Draft Teacher").teacher().insert(&pool).await.unwrap();
    test_material("Published", &subject, teacher.id)
        .insert(&pool)
        .await
        .unwrap();
    test_material("Unfinished", &subject, teacher.id)
        .draft()
        .insert(&pool)
        .await
        .unwrap();

    let page = CatalogService::new(pool)
        .search_materials(&subject_filter(&subject), PageRequest::default())
        .await
        .unwrap();

    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].title, "Published");
}

#[tokio::test]
async fn paging_covers_every_match_exactly_once() {
    let pool = common::test_pool().await;
    let subject = format!("paging-{}", unique_suffix());

    let teacher = test_user("Paging Teacher").teacher().insert(&pool).await.unwrap();
    let mut inserted = HashSet::new();
    for i in 0..5 {
        let material = test_material(&format!("Lesson {i}"), &subject, teacher.id)
            .insert(&pool)
            .await
            .unwrap();
        inserted.insert(material.id);
    }

    let service = CatalogService::new(pool);
    let filters = subject_filter(&subject);

    let mut seen: Vec<Uuid> = Vec::new();
    for page in 1..=3 {
        let result = service
            .search_materials(&filters, PageRequest::new(Some(page), Some(2)))
            .await
            .unwrap();
        assert_eq!(result.total, 5);
        assert_eq!(result.has_more(), page < 3);
        seen.extend(result.items.iter().map(|m| m.id));
    }

    assert_eq!(seen.len(), 5);
    let unique: HashSet<Uuid> = seen.iter().copied().collect();
    assert_eq!(unique, inserted);

    let beyond = service
        .search_materials(&filters, PageRequest::new(Some(4), Some(2)))
        .await
        .unwrap();
    assert!(beyond.items.is_empty());
    assert_eq!(beyond.total, 5);
}

#[tokio::test]
async fn zero_limit_returns_all_matches() {
    let pool = common::test_pool().await;
    let subject = format!("unlimited-{}", unique_suffix());

    let teacher = test_user("Unlimited Teacher").teacher().insert(&pool).await.unwrap();
    for i in 0..4 {
        test_material(&format!("Part {i}"), &subject, teacher.id)
            .insert(&pool)
            .await
            .unwrap();
    }

    let page = CatalogService::new(pool)
        .search_materials(&subject_filter(&subject), PageRequest::new(Some(3), Some(0)))
        .await
        .unwrap();

    assert_eq!(page.items.len(), 4);
    assert_eq!(page.total, 4);
    assert!(!page.has_more());
}

#[tokio::test]
async fn results_are_ordered_by_rating_and_unrated_score_zero() {
    let pool = common::test_pool().await;
    let subject = format!("rated-{}", unique_suffix());

    let teacher = test_user("Rated Teacher").teacher().insert(&pool).await.unwrap();
    let top = test_material("Top", &subject, teacher.id)
        .insert(&pool)
        .await
        .unwrap();
    let middle = test_material("Middle", &subject, teacher.id)
        .insert(&pool)
        .await
        .unwrap();
    let unrated = test_material("Unrated", &subject, teacher.id)
        .insert(&pool)
        .await
        .unwrap();

    let alice = test_user("Alice").insert(&pool).await.unwrap();
    let bob = test_user("Bob").insert(&pool).await.unwrap();
    insert_rating(&pool, top.id, alice.id, 5).await.unwrap();
    insert_rating(&pool, top.id, bob.id, 4).await.unwrap();
    insert_rating(&pool, middle.id, alice.id, 3).await.unwrap();

    let page = CatalogService::new(pool)
        .search_materials(&subject_filter(&subject), PageRequest::default())
        .await
        .unwrap();

    let ids: Vec<Uuid> = page.items.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![top.id, middle.id, unrated.id]);

    assert!((page.items[0].rating - 4.5).abs() < 1e-9);
    assert_eq!(page.items[0].students_count, 2);
    assert_eq!(page.items[2].rating, 0.0);
    assert_eq!(page.items[2].students_count, 0);

    let ratings: Vec<f64> = page.items.iter().map(|m| m.rating).collect();
    assert!(ratings.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn search_matches_title_or_author_case_insensitively() {
    let pool = common::test_pool().await;
    let token = unique_suffix();
    let subject = format!("search-{token}");

    let author = test_user(&format!("Author {token}"))
        .teacher()
        .insert(&pool)
        .await
        .unwrap();
    let other = test_user("Someone Else").teacher().insert(&pool).await.unwrap();

    test_material("Geometry", &subject, author.id)
        .insert(&pool)
        .await
        .unwrap();
    test_material(&format!("Quantum {token}"), &subject, other.id)
        .insert(&pool)
        .await
        .unwrap();
    test_material("Unrelated", &subject, other.id)
        .insert(&pool)
        .await
        .unwrap();

    let filters = MaterialFilters {
        search: Some(token.to_uppercase()),
        subject: Some(subject.clone()),
        ..Default::default()
    };
    let page = CatalogService::new(pool)
        .search_materials(&filters, PageRequest::default())
        .await
        .unwrap();

    assert_eq!(page.total, 2);
    let titles: HashSet<String> = page.items.iter().map(|m| m.title.clone()).collect();
    assert!(titles.contains("Geometry"));
    assert!(titles.contains(&format!("Quantum {token}")));
}

#[tokio::test]
async fn level_filter_narrows_results() {
    let pool = common::test_pool().await;
    let subject = format!("level-{}", unique_suffix());

    let teacher = test_user("Level Teacher").teacher().insert(&pool).await.unwrap();
    test_material("Intro", &subject, teacher.id)
        .with_level("beginner")
        .insert(&pool)
        .await
        .unwrap();
    test_material("Deep dive", &subject, teacher.id)
        .with_level("advanced")
        .insert(&pool)
        .await
        .unwrap();

    let service = CatalogService::new(pool);
    let broad = service
        .search_materials(&subject_filter(&subject), PageRequest::default())
        .await
        .unwrap();

    let filters = MaterialFilters {
        subject: Some(subject),
        level: Some("advanced".to_string()),
        ..Default::default()
    };
    let narrow = service
        .search_materials(&filters, PageRequest::default())
        .await
        .unwrap();

    assert_eq!(broad.total, 2);
    assert_eq!(narrow.total, 1);
    assert_eq!(narrow.items[0].level.as_deref(), Some("advanced"));
}

#[tokio::test]
async fn teacher_search_attaches_sorted_specializations() {
    let pool = common::test_pool().await;
    let token = unique_suffix();
    let physics = format!("physics-{token}");
    let math = format!("math-{token}");

    let teacher = test_user(&format!("Teacher {token}"))
        .teacher()
        .with_specializations(&[physics.as_str(), math.as_str()])
        .insert(&pool)
        .await
        .unwrap();
    test_material("Mechanics", &physics, teacher.id)
        .insert(&pool)
        .await
        .unwrap();
    test_material("Draft notes", &physics, teacher.id)
        .draft()
        .insert(&pool)
        .await
        .unwrap();

    // Students never appear, even with a matching name.
    test_user(&format!("Student {token}")).insert(&pool).await.unwrap();

    let filters = TeacherFilters {
        search: Some(token.clone()),
        ..Default::default()
    };
    let page = CatalogService::new(pool.clone())
        .search_teachers(&filters, PageRequest::default())
        .await
        .unwrap();

    assert_eq!(page.total, 1);
    let found = &page.items[0];
    assert_eq!(found.id, teacher.id);
    assert_eq!(found.specializations, vec![math.clone(), physics.clone()]);
    assert_eq!(found.materials_count, 1);
    assert_eq!(found.rating, 0.0);

    let by_subject = TeacherFilters {
        subject: Some(math),
        ..Default::default()
    };
    let page = CatalogService::new(pool)
        .search_teachers(&by_subject, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, teacher.id);
}

#[tokio::test]
async fn failed_specialization_lookup_still_returns_teachers() {
    let schema = format!("degraded_{}", unique_suffix());
    let pool = common::isolated_pool(&schema).await;

    let teacher = test_user("Degraded Teacher")
        .teacher()
        .with_specializations(&["math"])
        .insert(&pool)
        .await
        .unwrap();
    test_material("Fractions", "math", teacher.id)
        .insert(&pool)
        .await
        .unwrap();

    // Only the secondary lookup reads this column.
    sqlx::query("ALTER TABLE teacher_specializations RENAME COLUMN subject TO subject_code")
        .execute(&pool)
        .await
        .unwrap();

    let service = CatalogService::new(pool.clone());
    assert!(service.specializations_for_many(&[teacher.id]).await.is_err());

    let page = service
        .search_teachers(&TeacherFilters::default(), PageRequest::default())
        .await
        .unwrap();

    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, teacher.id);
    assert!(page.items[0].specializations.is_empty());
    assert_eq!(page.items[0].materials_count, 1);

    common::drop_schema(&pool, &schema).await;
}

#[tokio::test]
async fn specialization_lookup_handles_unknown_and_empty_keys() {
    let pool = common::test_pool().await;
    let service = CatalogService::new(pool);

    assert!(service.specializations_for_many(&[]).await.unwrap().is_empty());
    assert!(
        service
            .specializations_for_many(&[Uuid::now_v7()])
            .await
            .unwrap()
            .is_empty()
    );
}
