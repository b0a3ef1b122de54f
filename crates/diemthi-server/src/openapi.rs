//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::dto::{
    GroupTopResponse, HealthResponse, ImportResponse, ImportUpload, LevelCountsResponse,
    RankedStudentDto, ServiceStatus, SkipReasonsDto, StudentResponse,
};
use crate::handlers::{health, import, students};

/// OpenAPI documentation for the diemthi API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "diemthi API",
        version = "1.0.0",
        description = "Exam results service.

diemthi ingests national exam result CSV files into PostgreSQL and serves
per-candidate lookups and aggregate reports.

## Features

- **Import**: Bulk CSV upload with per-row validation and batched upserts
- **Lookup**: Full score sheet by registration number
- **Reports**: Top 10 per exam group, score level distribution per subject

## Quick Start

1. Check server health: `GET /api/v1/health`
2. Upload results: `POST /api/v1/students/import` (multipart field `file`)
3. Look up a candidate: `GET /api/v1/students/01000001`
",
        license(
            name = "Apache-2.0",
            url = "https://www.apache.org/licenses/LICENSE-2.0"
        )
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        health::health_check,
        import::import_students,
        students::get_student,
        students::top_by_group,
        students::level_counts,
    ),
    components(
        schemas(
            // Request types
            ImportUpload,
            // Response types
            HealthResponse,
            ServiceStatus,
            StudentResponse,
            RankedStudentDto,
            GroupTopResponse,
            LevelCountsResponse,
            ImportResponse,
            SkipReasonsDto,
        )
    ),
    tags(
        (name = "system", description = "System health"),
        (name = "import", description = "CSV bulk import"),
        (name = "students", description = "Student lookup and reports"),
    )
)]
pub struct ApiDoc;
