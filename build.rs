fn main() {
    #[cfg(feature = "firmware")]
    embuild::espidf::sysenv::output();
}
