pub mod inclusion_tests;
