mod make_subd;

pub use make_subd::MakeSubd;
