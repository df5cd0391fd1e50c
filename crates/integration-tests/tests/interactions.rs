use integration_tests::{identity, Harness};
use tb_core::error::AppError;
use tb_core::models::{Applied, CreatePost, InteractionKind};
use tb_core::traits::ForumRepo;
use tempfile::TempDir;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_likes_are_never_lost() {
    for h in Harness::all().await {
        let id = h.post("alice", "pizza", "Diavola", &h.in_hours(24)).await;
        let state = h.state.clone();

        let tasks: Vec<_> = (0..40)
            .map(|i| {
                let state = state.clone();
                tokio::spawn(async move {
                    state
                        .interactions
                        .apply_interaction(&identity(&format!("fan{i}")), id, "like", None)
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let post = h.state.registry.get_post("pizza", id).await.unwrap().unwrap();
        assert_eq!(post.likes, 40, "[{}]", h.backend);
        assert_eq!(post.dislikes, 0);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_likes_survive_a_pooled_file_database() {
    let dir = TempDir::new().unwrap();
    let h = Harness::sqlite_file(&dir).await;
    let id = h.post("alice", "pizza", "Marinara", &h.in_hours(24)).await;
    let due_now = h.in_hours(0);

    let tasks: Vec<_> = (0..200)
        .map(|i| {
            let state = h.state.clone();
            let due_now = due_now.clone();
            tokio::spawn(async move {
                if i % 4 == 0 {
                    // Gives the next sweep something to expire.
                    let flash = CreatePost {
                        title: format!("Flash {i}"),
                        topic: "crust".into(),
                        body: "gone soon".into(),
                        expiration_time: due_now,
                    };
                    state.registry.create_post("bob", flash).await?;
                }
                if i % 2 == 0 {
                    state.registry.list_by_topic("pizza").await?;
                }
                state
                    .interactions
                    .apply_interaction(&identity(&format!("fan{i}")), id, "like", None)
                    .await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let post = h.state.registry.get_post("pizza", id).await.unwrap().unwrap();
    assert_eq!((post.likes, post.dislikes), (200, 0));
    assert_eq!(h.state.interactions.list_interactions(id).await.unwrap().len(), 200);
    assert_eq!(h.state.ranking.expired_history("crust").await.unwrap().len(), 50);
}

#[tokio::test]
async fn same_user_may_like_repeatedly() {
    for h in Harness::all().await {
        let id = h.post("alice", "pizza", "Bianca", &h.in_hours(24)).await;
        let bob = identity("bob");

        for expected in 1..=3 {
            let applied = h.state.interactions.apply_interaction(&bob, id, "like", None).await.unwrap();
            assert_eq!(applied, Applied::Reacted { kind: InteractionKind::Like, likes: expected, dislikes: 0 });
        }
        let applied = h.state.interactions.apply_interaction(&bob, id, "dislike", None).await.unwrap();
        assert_eq!(applied, Applied::Reacted { kind: InteractionKind::Dislike, likes: 3, dislikes: 1 });
    }
}

#[tokio::test]
async fn missing_post_is_not_found_and_nothing_changes() {
    for h in Harness::all().await {
        let id = h.post("alice", "pizza", "Capricciosa", &h.in_hours(24)).await;
        let bob = identity("bob");

        let err = h.state.interactions.apply_interaction(&bob, 999, "like", None).await.unwrap_err();
        assert!(matches!(err, AppError::PostNotFound(999)), "[{}] {err}", h.backend);

        let post = h.state.registry.get_post("pizza", id).await.unwrap().unwrap();
        assert_eq!((post.likes, post.dislikes), (0, 0));
        assert!(h.repo.list_interactions(999).await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn unknown_kind_is_rejected_and_counters_unchanged() {
    for h in Harness::all().await {
        let id = h.post("alice", "pizza", "Napoletana", &h.in_hours(24)).await;

        let err = h
            .state
            .interactions
            .apply_interaction(&identity("bob"), id, "archive", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidKind(_)), "[{}] {err}", h.backend);

        let post = h.state.registry.get_post("pizza", id).await.unwrap().unwrap();
        assert_eq!((post.likes, post.dislikes), (0, 0));
        assert!(h.state.interactions.list_interactions(id).await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn comments_round_trip_in_submission_order() {
    for h in Harness::all().await {
        let id = h.post("alice", "pizza", "Funghi", &h.in_hours(24)).await;

        h.state
            .interactions
            .apply_interaction(&identity("bob"), id, "comment", Some("Needs more mushrooms"))
            .await
            .unwrap();
        h.state.interactions.add_comment(&identity("carol"), id, "Perfect as is").await.unwrap();
        h.state
            .interactions
            .apply_interaction(&identity("bob"), id, "comment", Some("Fair enough"))
            .await
            .unwrap();

        let comments = h.state.interactions.list_comments(id).await.unwrap();
        let seen: Vec<_> = comments.iter().map(|c| (c.user_name.as_str(), c.text.as_str())).collect();
        assert_eq!(
            seen,
            vec![("bob", "Needs more mushrooms"), ("carol", "Perfect as is"), ("bob", "Fair enough")],
            "[{}]",
            h.backend
        );
        assert!(comments.windows(2).all(|pair| pair[0].id < pair[1].id));

        let post = h.state.registry.get_post("pizza", id).await.unwrap().unwrap();
        assert_eq!((post.likes, post.dislikes), (0, 0));
    }
}

#[tokio::test]
async fn expired_posts_accept_interactions_but_hide_comments() {
    for h in Harness::all().await {
        let id = h.post("alice", "pizza", "Old news", &h.in_hours(1)).await;
        h.advance_hours(2);

        let applied = h.state.interactions.apply_interaction(&identity("bob"), id, "like", None).await.unwrap();
        assert_eq!(applied, Applied::Reacted { kind: InteractionKind::Like, likes: 1, dislikes: 0 });
        h.state.interactions.add_comment(&identity("bob"), id, "Too late?").await.unwrap();

        let err = h.state.interactions.list_comments(id).await.unwrap_err();
        assert!(matches!(err, AppError::PostNotFound(_)), "[{}] {err}", h.backend);

        let history = h.state.ranking.expired_history("pizza").await.unwrap();
        assert_eq!(history[0].likes, 1);
    }
}

#[tokio::test]
async fn interaction_log_records_time_left() {
    for h in Harness::all().await {
        let id = h.post("alice", "pizza", "Timed", &h.in_hours(3)).await;

        h.state.interactions.apply_interaction(&identity("bob"), id, "like", None).await.unwrap();
        h.advance_hours(1);
        h.state
            .interactions
            .apply_interaction(&identity("carol"), id, "comment", Some("Still here"))
            .await
            .unwrap();
        h.advance_hours(3);
        h.state.interactions.apply_interaction(&identity("dave"), id, "dislike", None).await.unwrap();

        let log = h.state.interactions.list_interactions(id).await.unwrap();
        let entries: Vec<_> = log.iter().map(|i| (i.user_name.as_str(), i.kind, i.time_left)).collect();
        assert_eq!(
            entries,
            vec![
                ("bob", InteractionKind::Like, 3 * 3600),
                ("carol", InteractionKind::Comment, 2 * 3600),
                ("dave", InteractionKind::Dislike, -3600),
            ],
            "[{}]",
            h.backend
        );

        assert!(matches!(
            h.state.interactions.list_interactions(999).await,
            Err(AppError::PostNotFound(999))
        ));
    }
}

#[tokio::test]
async fn comments_on_different_posts_do_not_mix() {
    for h in Harness::all().await {
        let first = h.post("alice", "pizza", "One", &h.in_hours(5)).await;
        let second = h.post("alice", "toppings", "Two", &h.in_hours(5)).await;
        let engine = &h.state.interactions;

        engine.add_comment(&identity("bob"), first, "on one").await.unwrap();
        engine.add_comment(&identity("bob"), second, "on two").await.unwrap();

        let on_first = engine.list_comments(first).await.unwrap();
        assert_eq!(on_first.len(), 1, "[{}]", h.backend);
        assert_eq!(on_first[0].post_id, first);
        assert_eq!(on_first[0].text, "on one");
    }
}
