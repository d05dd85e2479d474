//! Benchmark endpoints.
//!
//! A created benchmark runs in the background; progress arrives over the
//! push channel and the finished result is fetched with `get_benchmark`.

use serde::Serialize;

use crate::models::{
    BenchmarkComparison, BenchmarkCreate, BenchmarkList, BenchmarkResult, BenchmarkStarted,
    ExportFormat, QueryTestCase, TestCaseUploadResult,
};

use super::{ApiClient, ApiError, Download, RequestOptions};

#[derive(Serialize)]
struct TestCaseUpload<'a> {
    test_cases: &'a [QueryTestCase],
}

fn benchmark_path(id: &str) -> String {
    format!("benchmarks/{}", id)
}

impl ApiClient {
    pub async fn list_benchmarks(
        &self,
        skip: Option<u64>,
        limit: Option<u64>,
        status: Option<&str>,
    ) -> Result<BenchmarkList, ApiError> {
        let options = RequestOptions::get()
            .query_opt("skip", skip)
            .query_opt("limit", limit)
            .query_opt("status", status);
        self.request("benchmarks/", options).await
    }

    pub async fn create_benchmark(
        &self,
        benchmark: &BenchmarkCreate,
    ) -> Result<BenchmarkStarted, ApiError> {
        self.request("benchmarks/", RequestOptions::post().json(benchmark)?)
            .await
    }

    pub async fn get_benchmark(&self, id: &str) -> Result<BenchmarkResult, ApiError> {
        self.request(&benchmark_path(id), RequestOptions::get()).await
    }

    pub async fn delete_benchmark(&self, id: &str) -> Result<(), ApiError> {
        self.request_empty(&benchmark_path(id), RequestOptions::delete())
            .await
    }

    /// Fetch a finished benchmark rendered as a file
    pub async fn export_benchmark(
        &self,
        id: &str,
        format: ExportFormat,
    ) -> Result<Download, ApiError> {
        let path = format!("{}/export", benchmark_path(id));
        self.download(&path, RequestOptions::get().query("format", format))
            .await
    }

    pub async fn upload_test_cases(
        &self,
        cases: &[QueryTestCase],
    ) -> Result<TestCaseUploadResult, ApiError> {
        let body = TestCaseUpload { test_cases: cases };
        self.request("benchmarks/test-cases", RequestOptions::post().json(&body)?)
            .await
    }

    /// Ask the backend to synthesize test queries.
    ///
    /// `query_types` is sent as a repeated query parameter.
    pub async fn generate_test_cases(
        &self,
        num_cases: u32,
        query_types: &[&str],
    ) -> Result<Vec<QueryTestCase>, ApiError> {
        let options = query_types
            .iter()
            .fold(RequestOptions::get().query("num_cases", num_cases), |opts, t| {
                opts.query("query_types", t)
            });
        self.request("benchmarks/test-cases/generate", options).await
    }

    pub async fn compare_benchmarks(
        &self,
        first: &str,
        second: &str,
    ) -> Result<BenchmarkComparison, ApiError> {
        let path = format!("benchmarks/compare/{}/{}", first, second);
        self.request(&path, RequestOptions::get()).await
    }
}
