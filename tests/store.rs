//! End-to-end tests of the storage backend through its public trait
//!
//! Each test opens a fresh SQLite file in a temp directory and drives it the
//! way an NNTP command layer would: GROUP, LISTGROUP, ARTICLE, NEXT/LAST,
//! NEWGROUPS, NEWNEWS and LIST ACTIVE with a wildmat.

mod common;

use chrono::{Duration, Utc};
use common::{follow_up, open_store, post};
use newsstore::{Error, NumberRange, Watermarks, Wildmat};

#[tokio::test]
async fn test_group_session() {
    let (backend, db, _temp_dir) = open_store().await;
    db.create_group("comp.lang.go", Some("The Go programming language"))
        .await
        .unwrap();

    let group = backend.get_group("comp.lang.go").await.unwrap();
    assert_eq!(
        backend.get_group_watermarks(&group).await.unwrap(),
        Watermarks::default()
    );

    for (id, subject) in [
        ("<1@go>", "generics"),
        ("<2@go>", "modules"),
        ("<3@go>", "errors"),
    ] {
        backend
            .save_article(&post(id, subject), &["comp.lang.go"])
            .await
            .unwrap();
    }
    backend
        .save_article(
            &follow_up("<4@go>", "<1@go>", "Re: generics"),
            &["comp.lang.go"],
        )
        .await
        .unwrap();

    // GROUP
    let marks = backend.get_group_watermarks(&group).await.unwrap();
    assert_eq!(
        marks,
        Watermarks {
            count: 4,
            low: 1,
            high: 4
        }
    );
    assert_eq!(backend.get_articles_count(&group).await.unwrap(), marks.count);
    assert_eq!(
        backend.get_group_low_water_mark(&group).await.unwrap(),
        marks.low
    );
    assert_eq!(
        backend.get_group_high_water_mark(&group).await.unwrap(),
        marks.high
    );

    // LISTGROUP
    assert_eq!(
        backend.get_article_numbers(&group, 0, 0).await.unwrap(),
        vec![1, 2, 3, 4]
    );

    // ARTICLE by number, then NEXT and LAST
    let current = backend.get_article_by_number(&group, 2).await.unwrap();
    assert_eq!(current.header.get("Subject"), Some("modules"));
    let next = backend.get_next_article_by_num(&group, &current).await.unwrap();
    assert_eq!(next.number, 3);
    let last = backend.get_last_article_by_num(&group, &current).await.unwrap();
    assert_eq!(last.number, 1);

    // ARTICLE by Message-Id
    let by_id = backend.get_article("<4@go>").await.unwrap();
    assert_eq!(by_id.number, 4);
    assert_eq!(by_id.thread.as_deref(), Some("<1@go>"));
    assert_eq!(by_id.header.get("References"), Some("<1@go>"));

    // Threads
    assert_eq!(
        backend.get_new_threads(&group, 10, 0).await.unwrap(),
        vec![3, 2, 1]
    );
    assert_eq!(backend.get_thread(&group, 1).await.unwrap(), vec![4]);

    // XOVER-style range
    let overview: Vec<i64> = backend
        .get_articles_by_range(&group, 2, 3)
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.number)
        .collect();
    assert_eq!(overview, vec![2, 3]);
}

#[tokio::test]
async fn test_numbers_never_reused_across_failures() {
    let (backend, db, _temp_dir) = open_store().await;
    db.create_group("comp.lang.go", None).await.unwrap();
    let group = backend.get_group("comp.lang.go").await.unwrap();

    backend
        .save_article(&post("<a@go>", "a"), &["comp.lang.go"])
        .await
        .unwrap();
    let err = backend
        .save_article(&post("<a@go>", "again"), &["comp.lang.go"])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateArticle(_)), "got {:?}", err);

    let err = backend
        .save_article(&post("<b@go>", "b"), &["comp.lang.go", "comp.lang.cobol"])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NoSuchGroup(_)), "got {:?}", err);
    assert!(matches!(
        backend.get_article("<b@go>").await,
        Err(Error::NotFound(_))
    ));

    let saved = backend
        .save_article(&post("<c@go>", "c"), &["comp.lang.go"])
        .await
        .unwrap();
    assert_eq!(saved.number_in("comp.lang.go"), Some(2));
    assert_eq!(
        backend.get_article_numbers(&group, 0, 0).await.unwrap(),
        vec![1, 2]
    );
}

#[tokio::test]
async fn test_list_active_with_wildmat() {
    let (backend, db, _temp_dir) = open_store().await;
    let names = [
        "alt.binaries.sounds",
        "alt.binaries.x",
        "alt.test",
        "comp.lang.go",
        "comp.lang.rust",
    ];
    for name in names {
        db.create_group(name, None).await.unwrap();
    }

    for pattern in ["*", "alt.*,!alt.binaries.*", "comp.lang.[gr]*", "*.x,*.go"] {
        let wildmat: Wildmat = pattern.parse().unwrap();
        let expected: Vec<&str> = names
            .iter()
            .copied()
            .filter(|name| wildmat.matches(name))
            .collect();

        let listed: Vec<String> = backend
            .list_groups_by_pattern(pattern)
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.name)
            .collect();
        assert_eq!(listed, expected, "pattern {}", pattern);
    }

    assert!(matches!(
        backend.list_groups_by_pattern("alt.[").await,
        Err(Error::Pattern(_))
    ));
}

#[tokio::test]
async fn test_newgroups_and_newnews() {
    let (backend, db, _temp_dir) = open_store().await;
    let before = Utc::now() - Duration::seconds(5);

    db.create_group("comp.lang.go", None).await.unwrap();
    backend
        .save_article(&post("<n1@go>", "one"), &["comp.lang.go"])
        .await
        .unwrap();

    let groups = backend.get_new_groups_since(before).await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].name, "comp.lang.go");

    assert_eq!(
        backend.get_new_articles_since(before).await.unwrap(),
        vec!["<n1@go>"]
    );

    let later = Utc::now() + Duration::seconds(5);
    assert!(backend.get_new_groups_since(later).await.unwrap().is_empty());
    assert!(backend.get_new_articles_since(later).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sentinel_decoding_matches_queries() {
    let (backend, db, _temp_dir) = open_store().await;
    db.create_group("comp.lang.go", None).await.unwrap();
    let group = backend.get_group("comp.lang.go").await.unwrap();

    for i in 1..=6 {
        backend
            .save_article(&post(&format!("<s{}@go>", i), "s"), &["comp.lang.go"])
            .await
            .unwrap();
    }

    assert_eq!(NumberRange::from_sentinels(2, 5), NumberRange::Between(2, 5));
    assert_eq!(
        backend.get_article_numbers(&group, 2, 5).await.unwrap(),
        vec![3, 4]
    );
    assert_eq!(
        db.get_article_numbers_in(&group, NumberRange::After(4))
            .await
            .unwrap(),
        vec![5, 6]
    );
    assert_eq!(
        db.get_article_numbers_in(&group, NumberRange::Single(6))
            .await
            .unwrap(),
        vec![6]
    );
    assert!(
        backend
            .get_article_numbers(&group, -1, -1)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_store_survives_reopen() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("news.db");

    let db = newsstore::Database::new(&path).await.unwrap();
    db.create_group("comp.lang.go", None).await.unwrap();
    db.save_article(&post("<p1@go>", "persist"), &["comp.lang.go"])
        .await
        .unwrap();
    db.close().await;

    let db = newsstore::Database::new(&path).await.unwrap();
    let group = db.get_group("comp.lang.go").await.unwrap();
    let saved = db
        .save_article(&post("<p2@go>", "persist again"), &["comp.lang.go"])
        .await
        .unwrap();
    assert_eq!(saved.number_in("comp.lang.go"), Some(2));
    assert_eq!(db.get_article("<p1@go>").await.unwrap().number, 1);
    assert_eq!(
        db.get_group_watermarks(&group).await.unwrap(),
        Watermarks {
            count: 2,
            low: 1,
            high: 2
        }
    );
    db.close().await;
}
