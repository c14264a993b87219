use framewarden::{FrameDetails, FrameEntry, FrameId, FrameRegistry, FrameTarget, TabId};

fn details(host: &str) -> FrameDetails {
    FrameDetails::new(host)
}

fn hosts(chain: &[FrameDetails]) -> Vec<&str> {
    chain.iter().map(|d| d.hostname.as_str()).collect()
}

#[test]
fn deep_chain_is_parent_first() {
    let mut registry = FrameRegistry::new();
    let tab = TabId(3);
    registry.ancestors(&FrameTarget::root(tab, FrameId::MAIN), details("host0"));

    let depth = 25;
    for i in 1..=depth {
        let chain = registry.ancestors(
            &FrameTarget::child(tab, FrameId(i), FrameId(i - 1)),
            details(&format!("host{}", i)),
        );
        assert_eq!(chain.len(), i as usize);
        let expected: Vec<_> = (0..i).rev().map(|n| format!("host{}", n)).collect();
        assert_eq!(hosts(&chain), expected);
    }
}

#[test]
fn reload_forgets_previous_subframes() {
    let mut registry = FrameRegistry::new();
    let tab = TabId(1);
    registry.ancestors(&FrameTarget::root(tab, FrameId::MAIN), details("a.com"));
    registry.ancestors(&FrameTarget::child(tab, FrameId(1), FrameId::MAIN), details("b.com"));
    registry.ancestors(&FrameTarget::child(tab, FrameId(2), FrameId(1)), details("c.com"));

    // full page reload
    registry.ancestors(&FrameTarget::root(tab, FrameId::MAIN), details("a.com"));

    // a request from the stale frame 2, which never got registered again
    let chain = registry.ancestors(
        &FrameTarget::child(tab, FrameId(3), FrameId(2)),
        details("d.com"),
    );
    assert!(chain.is_empty());
    assert!(!registry.contains_tab(tab));
}

#[test]
fn reparented_descendants_keep_resolving() {
    let mut registry = FrameRegistry::new();
    let tab = TabId(1);
    registry.ancestors(&FrameTarget::root(tab, FrameId::MAIN), details("a.com"));
    registry.ancestors(
        &FrameTarget::child(tab, FrameId(4), FrameId::MAIN).with_document_id("X"),
        details("b.com"),
    );
    registry.ancestors(&FrameTarget::child(tab, FrameId(5), FrameId(4)), details("c.com"));
    registry.ancestors(&FrameTarget::child(tab, FrameId(6), FrameId(4)), details("d.com"));

    let chain = registry.ancestors(
        &FrameTarget::child(tab, FrameId(9), FrameId::MAIN).with_document_id("X"),
        details("b.com"),
    );
    assert_eq!(hosts(&chain), vec!["a.com"]);
    assert_eq!(registry.frame_count(tab), 4);

    for child in [5, 6] {
        assert_eq!(
            registry.frame(tab, FrameId(child)).unwrap().parent,
            Some(FrameId(9))
        );
    }
    let chain = registry.ancestors(
        &FrameTarget::child(tab, FrameId(7), FrameId(6)),
        details("e.com"),
    );
    assert_eq!(hosts(&chain), vec!["d.com", "b.com", "a.com"]);
}

#[test]
fn sync_matches_incremental_state() {
    let tab = TabId(12);
    let mut incremental = FrameRegistry::new();
    incremental.ancestors(&FrameTarget::root(tab, FrameId::MAIN), details("a.com"));
    incremental.ancestors(
        &FrameTarget::child(tab, FrameId(1), FrameId::MAIN).with_document_id("one"),
        details("b.com"),
    );
    incremental.ancestors(&FrameTarget::child(tab, FrameId(2), FrameId(1)), details("c.com"));
    incremental.ancestors(&FrameTarget::child(tab, FrameId(3), FrameId::MAIN), details("d.com"));
    incremental.ancestors(
        &FrameTarget::child(tab, FrameId(8), FrameId::MAIN).with_document_id("one"),
        details("b.com"),
    );

    let snapshot: Vec<FrameEntry<FrameDetails>> =
        incremental.tab(tab).unwrap().frames().cloned().collect();
    let mut restored = FrameRegistry::new();
    restored.sync(tab, snapshot);

    let queries = [
        FrameTarget::child(tab, FrameId(10), FrameId(2)),
        FrameTarget::child(tab, FrameId(11), FrameId(3)),
        FrameTarget::child(tab, FrameId(12), FrameId(8)),
        FrameTarget::child(tab, FrameId(2), FrameId(8)).with_document_id("two"),
        FrameTarget::child(tab, FrameId(13), FrameId(1)),
        FrameTarget::root(tab, FrameId::MAIN),
    ];
    for query in &queries {
        assert_eq!(
            incremental.ancestors(query, details("q.com")),
            restored.ancestors(query, details("q.com")),
            "{:?}",
            query
        );
        assert_eq!(incremental.frame_count(tab), restored.frame_count(tab));
    }
}

#[test]
fn broken_chain_requires_new_root() {
    let mut registry = FrameRegistry::new();
    let tab = TabId(2);
    registry.ancestors(&FrameTarget::root(tab, FrameId::MAIN), details("a.com"));
    assert!(registry
        .ancestors(&FrameTarget::child(tab, FrameId(5), FrameId(4)), details("x.com"))
        .is_empty());

    for frame in [1, 4, 5] {
        let target = FrameTarget::child(tab, FrameId(frame), FrameId::MAIN);
        assert!(registry.ancestors(&target, details("x.com")).is_empty());
    }
    assert!(!registry.contains_tab(tab));

    registry.ancestors(&FrameTarget::root(tab, FrameId::MAIN), details("a.com"));
    let chain = registry.ancestors(
        &FrameTarget::child(tab, FrameId(1), FrameId::MAIN),
        details("b.com"),
    );
    assert_eq!(hosts(&chain), vec!["a.com"]);
}

#[test]
fn many_tabs_stay_isolated() {
    let mut registry = FrameRegistry::new();
    let tabs = 100;
    let frames = 200;

    for tab in 0..tabs {
        let tab_id = TabId(tab);
        registry.ancestors(
            &FrameTarget::root(tab_id, FrameId::MAIN),
            details(&format!("tab{}.com", tab)),
        );
        for frame in 1..frames {
            // alternate between nesting below the previous frame and the root
            let parent = if frame % 2 == 0 { frame - 1 } else { 0 };
            let chain = registry.ancestors(
                &FrameTarget::child(tab_id, FrameId(frame), FrameId(parent)),
                details(&format!("tab{}-frame{}", tab, frame)),
            );
            assert_eq!(
                chain.last().map(|d| d.hostname.clone()),
                Some(format!("tab{}.com", tab))
            );
        }
    }
    assert_eq!(registry.tab_count(), tabs as usize);
    assert!(registry.tabs().all(|tab| tab.len() == frames as usize));

    for tab in 0..tabs {
        registry.unregister(TabId(tab), FrameId::MAIN);
        assert_eq!(registry.tab_count(), (tabs - tab - 1) as usize);
    }
    assert_eq!(registry.tab_count(), 0);
}

#[test]
fn purging_one_tab_leaves_others_untouched() {
    let mut registry = FrameRegistry::new();
    let (a, b) = (TabId(1), TabId(2));
    for tab in [a, b] {
        registry.ancestors(&FrameTarget::root(tab, FrameId::MAIN), details("top.com"));
        registry.ancestors(&FrameTarget::child(tab, FrameId(1), FrameId::MAIN), details("mid.com"));
        registry.ancestors(&FrameTarget::child(tab, FrameId(2), FrameId(1)), details("leaf.com"));
    }
    let lookup = FrameTarget::child(b, FrameId(3), FrameId(2));
    let mut before: Vec<_> = registry.tab(b).unwrap().frames().cloned().collect();

    // same frame ids as in tab b, but the parent only exists there
    assert!(registry
        .ancestors(&FrameTarget::child(a, FrameId(9), FrameId(7)), details("x.com"))
        .is_empty());
    assert!(!registry.contains_tab(a));
    assert_eq!(registry.frame_count(b), 3);
    let chain = registry.ancestors(&lookup, details("y.com"));
    assert_eq!(hosts(&chain), vec!["leaf.com", "mid.com", "top.com"]);
    registry.unregister(b, FrameId(3));

    // rebuild tab a and remove it frame by frame
    registry.ancestors(&FrameTarget::root(a, FrameId::MAIN), details("top.com"));
    registry.ancestors(&FrameTarget::child(a, FrameId(1), FrameId::MAIN), details("mid.com"));
    registry.unregister(a, FrameId(1));
    registry.unregister(a, FrameId::MAIN);
    assert!(!registry.contains_tab(a));

    let mut after: Vec<_> = registry.tab(b).unwrap().frames().cloned().collect();
    before.sort_by_key(|frame| frame.id.0);
    after.sort_by_key(|frame| frame.id.0);
    assert_eq!(before, after);
    let chain = registry.ancestors(&lookup, details("y.com"));
    assert_eq!(hosts(&chain), vec!["leaf.com", "mid.com", "top.com"]);
}
