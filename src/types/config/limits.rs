//! Size limits for the rate window, backfill and line channel

count_limit! {
    /// Number of buckets retained by a rate tracker
    ///
    /// The default of 60 gives a 10-minute window with 10-second buckets.
    ///
    /// # Examples
    /// ```
    /// use tailnginx::types::WindowSize;
    ///
    /// let size = WindowSize::new(60).unwrap();
    /// assert_eq!(size.get(), 60);
    ///
    /// // A window without buckets is meaningless
    /// assert!(WindowSize::new(0).is_none());
    /// ```
    #[doc(alias = "bucket_count")]
    pub struct WindowSize = 60;
}

count_limit! {
    /// Number of historical lines replayed from the end of the log at startup
    pub struct BacklogLines = 500;
}

count_limit! {
    /// Capacity of the channel between the tailer and the ingestion task
    pub struct ChannelCapacity = 1000;
}
