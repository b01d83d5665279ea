pub mod ai_grader;
