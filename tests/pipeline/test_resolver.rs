use laminate::pipeline::layers::{self, LayerId};
use laminate::pipeline::resolver::DependencyResolver;

#[test]
fn requesting_layer_three_adds_its_dependencies() {
    let resolution = DependencyResolver::new().resolve(&[3]);

    assert_eq!(
        resolution.corrected,
        vec![LayerId(1), LayerId(2), LayerId(3)]
    );
    assert_eq!(resolution.auto_added, vec![LayerId(1), LayerId(2)]);

    let mentions_one = resolution
        .warnings
        .iter()
        .any(|w| w.contains("Layer 3") && w.contains("layer 1"));
    let mentions_two = resolution
        .warnings
        .iter()
        .any(|w| w.contains("Layer 3") && w.contains("layer 2"));
    assert!(mentions_one, "warnings: {:?}", resolution.warnings);
    assert!(mentions_two, "warnings: {:?}", resolution.warnings);
}

#[test]
fn every_request_subset_resolves_closed_and_sorted() {
    let resolver = DependencyResolver::new();
    // All subsets of {1..6}, plus a couple of invalid ids mixed in.
    for mask in 0u32..64 {
        let mut request: Vec<u8> = (0..6)
            .filter(|bit| mask & (1 << bit) != 0)
            .map(|bit| bit as u8 + 1)
            .collect();
        if mask % 3 == 0 {
            request.push(0);
            request.push(42);
        }

        let resolution = resolver.resolve(&request);

        let mut sorted = resolution.corrected.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(resolution.corrected, sorted, "request {:?}", request);

        for id in &resolution.corrected {
            let spec = layers::layer_spec(*id).expect("corrected ids are valid");
            for dep in spec.dependencies {
                assert!(
                    resolution.corrected.contains(dep),
                    "request {:?}: layer {} missing dependency {}",
                    request,
                    id,
                    dep
                );
            }
        }
    }
}

#[test]
fn full_table_request_needs_no_corrections() {
    let resolution = DependencyResolver::new().resolve(&[1, 2, 3, 4, 5, 6]);
    assert_eq!(resolution.corrected.len(), 6);
    assert!(resolution.warnings.is_empty());
    assert!(resolution.auto_added.is_empty());
}

#[test]
fn layer_six_pulls_in_everything() {
    let resolution = DependencyResolver::new().resolve(&[6]);
    assert_eq!(resolution.corrected, layers::all_layer_ids());
    assert_eq!(resolution.auto_added.len(), 5);
}

#[test]
fn invalid_only_request_resolves_empty_with_warnings() {
    let resolution = DependencyResolver::new().resolve(&[0, 7, 255]);
    assert!(resolution.corrected.is_empty());
    assert_eq!(resolution.warnings.len(), 3);
}
