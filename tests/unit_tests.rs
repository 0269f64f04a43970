//! Integration tests for the simspace library.

use simspace::prelude::*;

mod metric_scenario_tests {
    use super::*;

    fn fp(len: usize, bits: &[usize]) -> BitVector {
        BitVector::from_set_bits(len, bits)
    }

    #[test]
    fn test_identical_vectors_scenario() {
        // length 10, 4 bits set each, identical: common = 4
        let x = fp(10, &[1, 3, 5, 7]);
        let y = fp(10, &[1, 3, 5, 7]);
        assert!((BitArrayMetric::Tanimoto.similarity(&x, &y) - 1.0).abs() < 1e-6);
        assert!((BitArrayMetric::Dice.similarity(&x, &y) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_disjoint_vectors_scenario() {
        // cx = 3, cy = 5, common = 0
        let x = fp(10, &[0, 1, 2]);
        let y = fp(10, &[3, 4, 5, 6, 7]);
        assert_eq!(BitArrayMetric::Tanimoto.similarity(&x, &y), 0.0);
        assert_eq!(BitArrayMetric::Asymmetric.similarity(&x, &y), 0.0);
    }

    #[test]
    fn test_all_zero_vectors_scenario() {
        // Tanimoto and Dice degenerate rules differ by design
        let x = BitVector::zeros(10);
        let y = BitVector::zeros(10);
        let tanimoto = BitArrayMetric::Tanimoto.similarity(&x, &y);
        let dice = BitArrayMetric::Dice.similarity(&x, &y);
        assert_eq!(tanimoto, 1.0);
        assert_eq!(dice, 0.0);
        assert_ne!(tanimoto, dice);
    }

    #[test]
    fn test_manhattan_string_comparison_start() {
        // comparison begins at index 1: the index-1 mismatch is counted,
        // an index-0 mismatch is not
        let f = Measure::new(MetricName::String(StringMetric::Manhattan));
        let data = ColumnData::Strings(vec!["AAAA".into(), "ABAA".into(), "BAAA".into()]);
        let dist = f.bind(&data, &MetricOptions::default()).unwrap();
        assert!((dist(0, 1) - 0.25).abs() < 1e-6);
        assert_eq!(dist(0, 2), 0.0);
    }

    #[test]
    fn test_duality_for_all_registered_bit_metrics() {
        let x = fp(64, &[0, 5, 9, 17, 33, 60]);
        let y = fp(64, &[0, 5, 9, 18, 33, 61]);
        for metric in BitArrayMetric::registered() {
            let s = metric.similarity(&x, &y);
            let d = metric.distance(&x, &y);
            assert!(
                (d - (1.0 / s - 1.0)).abs() < 1e-4,
                "duality broken for {}",
                metric.name()
            );
        }
    }

    #[test]
    fn test_self_similarity_for_non_degenerate_inputs() {
        let x = fp(32, &[2, 4, 8, 16]);
        for metric in [
            BitArrayMetric::Tanimoto,
            BitArrayMetric::Dice,
            BitArrayMetric::Cosine,
            BitArrayMetric::Asymmetric,
            BitArrayMetric::BraunBlanquet,
            BitArrayMetric::Kulczynski,
        ] {
            assert!(
                (metric.similarity(&x, &x) - 1.0).abs() < 1e-6,
                "self-similarity for {}",
                metric.name()
            );
        }
        assert_eq!(BitArrayMetric::Hamming.distance(&x, &x), 0.0);
        assert_eq!(BitArrayMetric::Euclidean.distance(&x, &x), 0.0);
    }
}

mod registry_tests {
    use super::*;

    #[test]
    fn test_available_metrics_is_flat_and_unique() {
        let names = available_metrics();
        assert_eq!(names.len(), 18);
        let mut unique = names.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn test_available_methods_contract() {
        let methods = available_methods();
        assert_eq!(methods, vec!["UMAP", "t-SNE", "SPE", "pSPE", "OriginalSPE"]);
    }

    #[test]
    fn test_unknown_metric_for_data_type_error() {
        let data = ColumnData::Numbers(vec![1.0, 2.0]);
        let err = Measure::new(MetricName::String(StringMetric::Levenshtein))
            .bind(&data, &MetricOptions::default())
            .err()
            .unwrap();
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert!(err.message().contains("Levenshtein"));
        assert!(err.message().contains("String"));
    }

    #[test]
    fn test_metrics_by_data_type_lists() {
        let reg = registry();
        assert_eq!(reg.metrics_by_data_type(DataType::Vector).len(), 1);
        assert_eq!(reg.metrics_by_data_type(DataType::String).len(), 3);
        assert_eq!(reg.metrics_by_data_type(DataType::BitArray).len(), 10);
        assert_eq!(reg.metrics_by_data_type(DataType::MacroMolecule).len(), 3);
        assert_eq!(reg.metrics_by_data_type(DataType::Number).len(), 1);
    }
}

mod distance_matrix_tests {
    use super::*;

    fn fingerprints(n: usize) -> Vec<BitVector> {
        (0..n)
            .map(|i| BitVector::from_set_bits(64, &[i % 64, (i * 11) % 64, (i * 29) % 64]))
            .collect()
    }

    #[test]
    fn test_cell_count() {
        let items = fingerprints(9);
        let m = DistanceMatrix::compute(&items, |a, b| BitArrayMetric::Dice.distance(a, b));
        assert_eq!(m.data().len(), 9 * 8 / 2);
    }

    #[test]
    fn test_parallel_equals_sequential_on_fingerprints() {
        let items = fingerprints(40);
        let seq = DistanceMatrix::compute(&items, |a, b| BitArrayMetric::Tanimoto.distance(a, b));
        let par = DistanceMatrix::compute_parallel(&items, |a, b| {
            BitArrayMetric::Tanimoto.distance(a, b)
        });
        assert_eq!(seq.data(), par.data());
    }

    #[test]
    fn test_background_service_roundtrip() {
        let request = DistanceMatrixRequest {
            data: ColumnData::BitVectors(fingerprints(10)),
            metric: MetricName::BitArray(BitArrayMetric::Dice),
            metric_options: MetricOptions::default(),
            normalize: true,
        };
        let service = DistanceMatrixService::spawn(request, CancellationToken::new());
        let matrix = service.wait().unwrap();
        assert_eq!(matrix.size(), 10);
        assert!(matrix.max() <= 1.0);
    }

    #[test]
    fn test_sparse_graph_and_knn() {
        let data = ColumnData::BitVectors(fingerprints(12));
        let sparse = calc_sparse(
            &data,
            MetricName::BitArray(BitArrayMetric::Tanimoto),
            &MetricOptions::default(),
            0.0,
        )
        .unwrap();
        for k in 0..sparse.len() {
            assert!(sparse.i[k] < sparse.j[k]);
            assert!(sparse.distances[k] <= 1.0);
        }
        let knn = knn_from_edges(&sparse, 3, 12);
        assert_eq!(knn.indexes.len(), 12);
        for row in &knn.distances {
            assert!(row.windows(2).all(|w| w[0] <= w[1]));
        }
    }
}

mod reduction_tests {
    use super::*;
    use simspace::reduce::{effective_neighbors, materialize_decision};

    fn fingerprints(n: usize) -> ColumnData {
        ColumnData::BitVectors(
            (0..n)
                .map(|i| {
                    BitVector::from_set_bits(64, &[i % 64, (i * 7 + 1) % 64, (i * 19 + 3) % 64])
                })
                .collect(),
        )
    }

    #[test]
    fn test_umap_neighbor_clamp() {
        // for 10 items the effective neighbor count is 9, never the
        // configured default
        assert_eq!(effective_neighbors(10, 15), 9);
        assert_eq!(effective_neighbors(10, 40), 9);
    }

    #[test]
    fn test_materialization_guard_at_25000() {
        // no override: the size-warning path, not a ~3 * 10^8-cell allocation
        assert!(!materialize_decision(DimReductionMethod::Umap, 25000, false).unwrap());
        assert!(materialize_decision(DimReductionMethod::Umap, 25000, true).unwrap());
        assert!(
            materialize_decision(DimReductionMethod::TSne, 25000, false).is_err()
        );
    }

    #[test]
    fn test_umap_end_to_end_small_input() {
        let reducer = DimensionalityReducer::new(
            fingerprints(10),
            DimReductionMethod::Umap,
            MetricName::BitArray(BitArrayMetric::Tanimoto),
            ReductionOptions::new()
                .with_seed(4)
                .with_umap(UmapOptions::new().with_n_epochs(50)),
        )
        .unwrap();
        let result = reducer
            .transform(&EmbedContext::new())
            .unwrap()
            .completed()
            .unwrap();
        assert_eq!(result.embedding.len(), 10);
        assert!(result
            .embedding
            .iter()
            .all(|p| p[0].is_finite() && p[1].is_finite()));
    }

    #[test]
    fn test_tsne_end_to_end() {
        let reducer = DimensionalityReducer::new(
            fingerprints(8),
            DimReductionMethod::TSne,
            MetricName::BitArray(BitArrayMetric::Dice),
            ReductionOptions::new()
                .with_seed(2)
                .with_tsne(TsneOptions::new().with_iterations(30).with_perplexity(3.0)),
        )
        .unwrap();
        let result = reducer
            .transform(&EmbedContext::new())
            .unwrap()
            .completed()
            .unwrap();
        assert_eq!(result.embedding.len(), 8);
    }

    #[test]
    fn test_equilateral_inputs_embed_equilateral() {
        // three items with equal pairwise distances must land at mutually
        // equal distances, within the embedder's tolerance
        let column = ColumnData::Strings(vec!["AB".into(), "BC".into(), "CA".into()]);
        // every pair differs at both positions: Levenshtein distance 2
        let reducer = DimensionalityReducer::new(
            column,
            DimReductionMethod::Spe,
            MetricName::String(StringMetric::Levenshtein),
            ReductionOptions::new()
                .with_seed(13)
                .with_spe(SpeOptions::new().with_cycles(20_000)),
        )
        .unwrap();
        let result = reducer
            .transform(&EmbedContext::new())
            .unwrap()
            .completed()
            .unwrap();
        let y = &result.embedding;
        let mut sides = Vec::new();
        for i in 0..3 {
            for j in (i + 1)..3 {
                sides.push(((y[i][0] - y[j][0]).powi(2) + (y[i][1] - y[j][1]).powi(2)).sqrt());
            }
        }
        let max = sides.iter().copied().fold(0.0f32, f32::max);
        let min = sides.iter().copied().fold(f32::INFINITY, f32::min);
        assert!(min > 0.0);
        assert!(max / min < 1.3, "sides {sides:?}");
    }

    #[test]
    fn test_progress_reports_and_snapshot_shape() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let ctx = EmbedContext::new()
            .with_seed(Some(1))
            .with_progress(Arc::new(move |_epoch, total, snapshot| {
                assert!(total > 0);
                assert_eq!(snapshot.len(), 6);
                seen.fetch_add(1, Ordering::SeqCst);
            }));
        let reducer = DimensionalityReducer::new(
            fingerprints(6),
            DimReductionMethod::TSne,
            MetricName::BitArray(BitArrayMetric::Tanimoto),
            ReductionOptions::new().with_cycles(10),
        )
        .unwrap();
        reducer.transform(&ctx).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_cancellation_resolves_cancelled_not_error() {
        let token = CancellationToken::new();
        token.cancel();
        let reducer = DimensionalityReducer::new(
            fingerprints(20),
            DimReductionMethod::Umap,
            MetricName::BitArray(BitArrayMetric::Tanimoto),
            ReductionOptions::default(),
        )
        .unwrap();
        let ctx = EmbedContext::new().with_cancellation(token);
        let outcome = reducer.transform(&ctx).unwrap();
        assert!(matches!(outcome, ReductionOutcome::Cancelled));
    }

    #[test]
    fn test_runner_terminate_stops_run() {
        let runner = ReductionRunner::spawn(
            ReductionRequest {
                data: fingerprints(300),
                method: DimReductionMethod::Spe,
                metric: MetricName::BitArray(BitArrayMetric::Tanimoto),
                options: ReductionOptions::new().with_cycles(50_000_000).with_seed(6),
            },
            CancellationToken::new(),
            None,
        );
        // terminate the in-flight run; it must resolve without error
        let outcome = runner.terminate().unwrap();
        match outcome {
            ReductionOutcome::Cancelled => {}
            ReductionOutcome::Completed(r) => assert_eq!(r.embedding.len(), 300),
        }
    }

    #[test]
    fn test_macromolecule_reduction_with_options() {
        let column = ColumnData::Strings(vec![
            "FWRWY".into(),
            "FWRWW".into(),
            "YYYYY".into(),
            "FWRYY".into(),
        ]);
        let reducer = DimensionalityReducer::new(
            column,
            DimReductionMethod::Spe,
            MetricName::MacroMolecule(MacroMoleculeMetric::NeedlemanWunsch),
            ReductionOptions::new().with_seed(8),
        )
        .unwrap();
        let result = reducer
            .transform(&EmbedContext::new())
            .unwrap()
            .completed()
            .unwrap();
        assert_eq!(result.embedding.len(), 4);
    }
}

mod cluster_tests {
    use super::*;

    fn families() -> ColumnData {
        ColumnData::BitVectors(vec![
            BitVector::from_set_bits(32, &[0, 1, 2, 3]),
            BitVector::from_set_bits(32, &[0, 1, 2, 4]),
            BitVector::from_set_bits(32, &[0, 1, 3, 4]),
            BitVector::from_set_bits(32, &[16, 17, 18, 19]),
            BitVector::from_set_bits(32, &[16, 17, 18, 20]),
        ])
    }

    fn request() -> ClusterRequest {
        ClusterRequest {
            columns: vec![families()],
            metrics: vec![MetricName::BitArray(BitArrayMetric::Tanimoto)],
            metric_options: vec![MetricOptions::default()],
            threshold: 30.0,
            weights: vec![1.0],
            aggregation: DistanceAggregationMethod::Manhattan,
            max_iterations: 5,
            use_accelerated: false,
        }
    }

    #[test]
    fn test_cluster_service_end_to_end() {
        let service = ClusterService::spawn(request(), CancellationToken::new(), None);
        let labels = service.wait().unwrap();
        assert_eq!(labels.len(), 5);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[3], labels[4]);
        assert_ne!(labels[0], labels[3]);
    }

    #[test]
    fn test_forced_accelerated_failure_still_clusters() {
        use simspace::cluster::AcceleratedMclBackend;
        use simspace::distance_matrix::sparse::SparseMatrixResult;

        struct AlwaysFails;
        impl AcceleratedMclBackend for AlwaysFails {
            fn transform(
                &self,
                _sparse: &SparseMatrixResult,
                _item_count: usize,
                _params: &MclParams,
            ) -> simspace::Result<Vec<u32>> {
                Err(SimError::internal("no device"))
            }
        }

        let mut req = request();
        req.use_accelerated = true;
        let service = ClusterService::spawn(
            req,
            CancellationToken::new(),
            Some(std::sync::Arc::new(AlwaysFails)),
        );
        // the forced accelerated failure is logged, not propagated
        let labels = service.wait().unwrap();
        assert_eq!(labels.len(), 5);
        assert_ne!(labels[0], labels[3]);
    }

    #[test]
    fn test_mismatched_weights_fail_fast() {
        let mut req = request();
        req.weights = vec![1.0, 2.0];
        let err = ClusterService::spawn(req, CancellationToken::new(), None)
            .wait()
            .unwrap_err();
        assert!(err.message().contains("same length"));
    }
}

mod worker_boundary_tests {
    use super::*;

    #[test]
    fn test_reduction_request_is_serializable() {
        let request = ReductionRequest {
            data: ColumnData::Strings(vec!["AAA".into(), "AAB".into()]),
            method: DimReductionMethod::Umap,
            metric: MetricName::String(StringMetric::Levenshtein),
            options: ReductionOptions::new().with_seed(1).with_cycles(5),
        };
        let json = serde_json::to_string(&request).unwrap();
        let back: ReductionRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.method, DimReductionMethod::Umap);
        assert_eq!(back.metric, MetricName::String(StringMetric::Levenshtein));
        assert_eq!(back.options.cycles, Some(5));
    }

    #[test]
    fn test_metric_names_travel_as_strings() {
        let json = serde_json::to_string(&MetricName::MacroMolecule(
            MacroMoleculeMetric::NeedlemanWunsch,
        ))
        .unwrap();
        assert_eq!(json, "\"Needleman-Wunsch\"");
    }

    #[test]
    fn test_runner_roundtrip_via_serialized_request() {
        let request = ReductionRequest {
            data: ColumnData::BitVectors(
                (0..6)
                    .map(|i| BitVector::from_set_bits(16, &[i, i + 4, i + 8]))
                    .collect(),
            ),
            method: DimReductionMethod::Spe,
            metric: MetricName::BitArray(BitArrayMetric::Dice),
            options: ReductionOptions::new().with_seed(3),
        };
        let json = serde_json::to_string(&request).unwrap();
        let back: ReductionRequest = serde_json::from_str(&json).unwrap();
        let runner = ReductionRunner::spawn(back, CancellationToken::new(), None);
        let result = runner.wait().unwrap().completed().unwrap();
        assert_eq!(result.embedding.len(), 6);
    }
}
