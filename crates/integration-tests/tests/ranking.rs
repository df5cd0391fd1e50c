use integration_tests::{identity, Harness};
use tb_core::models::PostStatus;

async fn react(h: &Harness, id: i64, kind: &str, times: usize) {
    for _ in 0..times {
        h.state
            .interactions
            .apply_interaction(&identity("voter"), id, kind, None)
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn most_active_picks_one_post_per_live_topic() {
    for h in Harness::all().await {
        let quiet = h.post("alice", "pizza", "Quiet", &h.in_hours(24)).await;
        let popular = h.post("bob", "pizza", "Popular", &h.in_hours(24)).await;
        let divisive = h.post("carol", "pizza", "Divisive", &h.in_hours(24)).await;
        let lonely = h.post("dave", "crust", "Lonely", &h.in_hours(24)).await;

        react(&h, quiet, "like", 1).await;
        react(&h, popular, "like", 4).await;
        react(&h, divisive, "like", 4).await;
        react(&h, divisive, "dislike", 2).await;

        let ranking = h.state.ranking.most_active_per_topic().await.unwrap();
        assert_eq!(ranking.len(), 2, "[{}]", h.backend);
        assert_eq!(ranking["pizza"].id, divisive);
        assert_eq!(ranking["crust"].id, lonely);
    }
}

#[tokio::test]
async fn expired_posts_never_rank() {
    for h in Harness::all().await {
        let star = h.post("alice", "pizza", "Star", &h.in_hours(1)).await;
        let modest = h.post("bob", "pizza", "Modest", &h.in_hours(10)).await;
        let gone = h.post("carol", "toppings", "Gone", &h.in_hours(1)).await;

        react(&h, star, "like", 10).await;
        react(&h, modest, "like", 1).await;
        react(&h, gone, "like", 3).await;
        h.advance_hours(2);

        let ranking = h.state.ranking.most_active_per_topic().await.unwrap();
        assert_eq!(ranking.get("pizza").map(|p| p.id), Some(modest), "[{}]", h.backend);
        assert!(!ranking.contains_key("toppings"));
        assert!(ranking.values().all(|p| p.status == PostStatus::Live));
    }
}

#[tokio::test]
async fn full_ties_resolve_the_same_way_every_time() {
    for h in Harness::all().await {
        let first = h.post("alice", "pizza", "First", &h.in_hours(24)).await;
        let second = h.post("bob", "pizza", "Second", &h.in_hours(24)).await;
        react(&h, first, "like", 2).await;
        react(&h, second, "like", 2).await;

        for _ in 0..5 {
            let ranking = h.state.ranking.most_active_per_topic().await.unwrap();
            assert_eq!(ranking["pizza"].id, first, "[{}]", h.backend);
        }
    }
}

#[tokio::test]
async fn history_keeps_full_projection() {
    for h in Harness::all().await {
        let id = h.post("alice", "pizza", "Archived", &h.in_hours(1)).await;
        react(&h, id, "like", 2).await;
        react(&h, id, "dislike", 1).await;
        h.advance_hours(1);

        let history = h.state.ranking.expired_history("pizza").await.unwrap();
        assert_eq!(history.len(), 1, "[{}]", h.backend);
        let post = &history[0];
        assert_eq!((post.likes, post.dislikes), (2, 1));
        assert_eq!(post.body, "Archived body");
        assert!(h.state.ranking.expired_history("toppings").await.unwrap().is_empty());
    }
}
