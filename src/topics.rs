//! Set algebra over per-article topic sets and sentiment tallies.
//!
//! Everything here is pure: the same articles always produce the same
//! distribution and topic overlap. `BTreeSet`/`BTreeMap` keep the output
//! order deterministic.

use crate::models::{Article, Sentiment, TopicOverlap};
use std::collections::{BTreeMap, BTreeSet};

/// Count articles per sentiment. Sentiments that never occur are absent.
pub fn sentiment_distribution(articles: &[Article]) -> BTreeMap<Sentiment, usize> {
    articles.iter().fold(BTreeMap::new(), |mut tally, article| {
        *tally.entry(article.sentiment).or_insert(0) += 1;
        tally
    })
}

/// Intersection of every set. An empty input yields the empty set.
pub fn intersect_all<'a, I>(sets: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a BTreeSet<String>>,
{
    let mut sets = sets.into_iter();
    let Some(first) = sets.next() else {
        return BTreeSet::new();
    };
    sets.fold(first.clone(), |acc, set| acc.intersection(set).cloned().collect())
}

/// Union of every set. An empty input yields the empty set.
pub fn union_all<'a, I>(sets: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a BTreeSet<String>>,
{
    sets.into_iter().fold(BTreeSet::new(), |mut acc, set| {
        acc.extend(set.iter().cloned());
        acc
    })
}

/// For each set, the topics that no other set contains and that are not in `common`.
///
/// `common` only changes the result when there is a single set; with two or
/// more sets a common topic is always present in some other set already.
pub fn unique_per_set(sets: &[BTreeSet<String>], common: &BTreeSet<String>) -> Vec<BTreeSet<String>> {
    sets.iter()
        .enumerate()
        .map(|(i, set)| {
            let others = union_all(
                sets.iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, other)| other),
            );
            set.iter()
                .filter(|topic| !others.contains(*topic) && !common.contains(*topic))
                .cloned()
                .collect()
        })
        .collect()
}

/// Compare topics across all articles, surfacing unique topics for the first two.
///
/// Common topics only consider articles that have topics, so an article whose
/// topics call fell back does not empty the intersection.
pub fn topic_overlap(articles: &[Article]) -> TopicOverlap {
    let sets: Vec<BTreeSet<String>> = articles.iter().map(Article::topic_set).collect();
    let common_topics = intersect_all(sets.iter().filter(|set| !set.is_empty()));
    let mut unique = unique_per_set(&sets, &common_topics).into_iter();

    TopicOverlap {
        unique_topics_in_article_1: unique.next().unwrap_or_default(),
        unique_topics_in_article_2: unique.next().unwrap_or_default(),
        common_topics,
    }
}
