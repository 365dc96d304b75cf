pub mod enhancer;
