//! Seed corpus of evaluation guidelines for the vector store.

use serde_json::json;
use tracing::{info, warn};

use super::{ChromaClient, RetrievalError};

struct GuidelineDoc {
    id: &'static str,
    content: &'static str,
    category: &'static str,
    doc_type: &'static str,
}

const GUIDELINES: [GuidelineDoc; 4] = [
    GuidelineDoc {
        id: "backend_skills_golang",
        category: "backend_skills",
        doc_type: "skills",
        content: "Go (Golang) Backend Development Skills:\n\
            - Strong understanding of Go syntax, goroutines, and channels\n\
            - Experience with popular Go frameworks like Gin, Echo, or Fiber\n\
            - Database integration with GORM, sqlx, or standard database/sql\n\
            - RESTful API design and implementation\n\
            - Microservices architecture knowledge\n\
            - Docker containerization and deployment\n\
            - Testing with Go testing package and testify\n\
            - Version control with Git\n\
            - Understanding of clean architecture and dependency injection",
    },
    GuidelineDoc {
        id: "project_evaluation_criteria",
        category: "evaluation_criteria",
        doc_type: "project_assessment",
        content: "Project Evaluation Criteria:\n\
            1. Code Quality (25%): clean, readable, well-structured code with \
            proper error handling, logging, and documentation.\n\
            2. Architecture (25%): clean architecture, separation of concerns, \
            dependency injection, sound database design and migrations.\n\
            3. Functionality (25%): working REST API endpoints, complete CRUD \
            operations, input validation and sanitization, consistent response \
            formatting.\n\
            4. Technical Implementation (25%): database integration and queries, \
            authentication and authorization where required, testing coverage, \
            containerized deployment.",
    },
    GuidelineDoc {
        id: "cv_evaluation_guidelines",
        category: "cv_evaluation",
        doc_type: "guidelines",
        content: "CV Evaluation Guidelines:\n\
            1. Experience Level: junior (0-2 years) basic understanding and \
            simple projects; mid-level (2-5 years) solid experience with complex \
            projects; senior (5+ years) leadership, architecture decisions, \
            mentoring.\n\
            2. Technical Skills: programming language proficiency, framework and \
            library experience, database management, DevOps and deployment \
            knowledge, testing and quality assurance.\n\
            3. Project Portfolio: diversity, complexity and scale of projects, \
            technologies used, problem-solving approach, documentation quality.\n\
            4. Soft Skills: communication evident from project descriptions, \
            teamwork and collaboration, learning attitude and adaptability.",
    },
    GuidelineDoc {
        id: "scoring_rubric",
        category: "scoring",
        doc_type: "rubric",
        content: "Scoring Rubric:\n\
            CV Match Rate (0.0-1.0): 0.9-1.0 exceptional match exceeding \
            requirements; 0.8-0.9 strong match; 0.6-0.8 good match meeting basic \
            requirements; 0.4-0.6 fair match with gaps; 0.2-0.4 poor match with \
            significant gaps; 0.0-0.2 major misalignment.\n\
            Project Score (0-10): 9-10 exceptional, production-ready; 7-8 high \
            quality with minor improvements needed; 5-6 good quality, some \
            improvements needed; 3-4 fair quality, significant improvements \
            needed; 1-2 poor quality with major issues; 0 non-functional.",
    },
];

/// Load the guideline corpus into the vector store. Individual insert
/// failures are logged and skipped so a partial seed still leaves a usable
/// collection.
pub async fn run(client: &ChromaClient) -> Result<(), RetrievalError> {
    let mut added = 0;

    for doc in &GUIDELINES {
        let metadata = json!({
            "category": doc.category,
            "type": doc.doc_type,
        });

        match client.add_document(doc.id, doc.content, metadata).await {
            Ok(()) => {
                info!("Added guideline document: {}", doc.id);
                added += 1;
            }
            Err(e) => warn!("Failed to add document {}: {}", doc.id, e),
        }
    }

    info!("Seeding completed: {}/{} documents added", added, GUIDELINES.len());
    Ok(())
}
